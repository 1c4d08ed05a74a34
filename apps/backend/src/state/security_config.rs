use jsonwebtoken::Algorithm;

/// JWT settings shared by token minting and the request extractor.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: Vec<u8>,
    pub algorithm: Algorithm,
}

impl SecurityConfig {
    pub fn new(jwt_secret: &[u8]) -> Self {
        Self {
            jwt_secret: jwt_secret.to_vec(),
            algorithm: Algorithm::HS256,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::new(b"test-secret-key-not-for-production")
    }
}
