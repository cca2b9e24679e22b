use mediacast_backend::{
    types::UserId,
    utils::jwt::{create_access_token, verify_access_token, Claims},
};

#[test]
fn jwt_create_and_verify_access_token() {
    let user_id = UserId::new();
    let (token, claims) = create_access_token(
        user_id.to_string(),
        "streamer@example.com".into(),
        "testsecret",
        1,
    )
    .expect("create token");

    assert!(!token.is_empty());
    let verified = verify_access_token(&token, "testsecret").expect("verify");
    assert_eq!(verified.sub, claims.sub);
    assert_eq!(verified.user_id().expect("user id"), user_id);
    assert_eq!(verified.email, "streamer@example.com");
}

#[test]
fn jwt_verify_with_wrong_secret_fails() {
    let (token, _) = create_access_token(
        UserId::new().to_string(),
        "streamer@example.com".into(),
        "secret1",
        1,
    )
    .expect("create token");

    assert!(verify_access_token(&token, "secret2").is_err());
}

#[test]
fn jwt_expired_token_fails_verification() {
    let expired_claims = Claims {
        sub: UserId::new().to_string(),
        email: "streamer@example.com".into(),
        exp: chrono::Utc::now().timestamp() - 3600,
        iat: chrono::Utc::now().timestamp() - 7200,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &expired_claims,
        &jsonwebtoken::EncodingKey::from_secret("secret".as_ref()),
    )
    .expect("encode token");

    assert!(verify_access_token(&token, "secret").is_err());
}

#[test]
fn jwt_malformed_token_fails() {
    assert!(verify_access_token("invalid.token.here", "secret").is_err());
}

#[test]
fn jwt_claims_have_unique_jti_and_expected_expiration() {
    let expiration_hours = 2u64;
    let (_, first) =
        create_access_token("user".into(), "a@example.com".into(), "secret", expiration_hours)
            .unwrap();
    let (_, second) =
        create_access_token("user".into(), "a@example.com".into(), "secret", expiration_hours)
            .unwrap();

    assert_ne!(first.jti, second.jti);
    let expected_exp = first.iat + (expiration_hours as i64 * 3600);
    assert!((first.exp - expected_exp).abs() <= 1);
}
