// 🔑 Admin session token
//
// The token is a capability handed to whoever needs it (the router state),
// never read from global state. Presence of a matching bearer token is what
// makes a request an admin request.

use sha2::{Digest, Sha256};

#[derive(Clone)]
pub struct AdminToken {
    /// None: no token configured, every check fails
    digest: Option<[u8; 32]>,
}

impl AdminToken {
    pub fn new(token: Option<&str>) -> Self {
        AdminToken {
            digest: token.map(digest),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.digest.is_some()
    }

    /// Check a raw `Authorization` header value (`Bearer <token>`)
    pub fn verify_header(&self, header: Option<&str>) -> bool {
        let Some(presented) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
            return false;
        };
        self.verify(presented.trim())
    }

    /// Digests are compared, so timing does not depend on a shared prefix
    pub fn verify(&self, presented: &str) -> bool {
        match &self.digest {
            Some(expected) => {
                let presented = digest(presented);
                expected
                    .iter()
                    .zip(presented.iter())
                    .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                    == 0
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminToken")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn digest(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}
