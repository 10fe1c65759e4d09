use super::*;
use axum::http::Request;
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";

fn token(sub: &str, role: &str, exp: usize, secret: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        role: role.to_string(),
        email: Some("test@example.com".to_string()),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn parts(authorization: Option<&str>) -> Parts {
    let mut builder = Request::builder().uri("/api/v1/tickets");
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    let (mut parts, _) = builder.body(()).unwrap().into_parts();
    parts.extensions.insert(Arc::new(JwtKeys::new(SECRET)));
    parts
}

#[test]
fn test_validate_jwt_success() {
    let keys = JwtKeys::new(SECRET);
    let user = validate_jwt(&token("7", "customer", 9999999999, SECRET), &keys)
        .expect("Valid token should pass");
    assert_eq!(user.user_id, 7);
    assert!(!user.staff);
    assert_eq!(user.email.as_deref(), Some("test@example.com"));
}

#[test]
fn test_validate_jwt_expired() {
    let keys = JwtKeys::new(SECRET);
    let result = validate_jwt(&token("7", "customer", 1, SECRET), &keys);
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

#[test]
fn test_validate_jwt_invalid_signature() {
    let keys = JwtKeys::new(SECRET);
    let result = validate_jwt(&token("7", "customer", 9999999999, "wrongsecret"), &keys);
    assert!(result.is_err());
}

#[test]
fn test_validate_jwt_rejects_bad_subject_and_role() {
    let keys = JwtKeys::new(SECRET);
    assert!(validate_jwt(&token("not-a-number", "customer", 9999999999, SECRET), &keys).is_err());
    assert!(validate_jwt(&token("7", "root", 9999999999, SECRET), &keys).is_err());
}

#[tokio::test]
async fn test_extractor_reads_bearer_token() {
    let header = format!("Bearer {}", token("3", "staff", 9999999999, SECRET));
    let mut parts = parts(Some(&header));

    let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(user.user_id, 3);
    assert!(user.staff);

    let StaffUser(staff) = StaffUser::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(staff.user_id, 3);
}

#[tokio::test]
async fn test_extractor_rejects_missing_header_and_customers_on_staff_routes() {
    let mut missing = parts(None);
    assert!(matches!(
        AuthUser::from_request_parts(&mut missing, &()).await,
        Err(AuthError::MissingToken)
    ));

    let header = format!("Bearer {}", token("7", "customer", 9999999999, SECRET));
    let mut customer = parts(Some(&header));
    let err = StaffUser::from_request_parts(&mut customer, &())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
}
