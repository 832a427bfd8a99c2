/// Bearer-token check for staff-only surfaces.
///
/// With no token configured the gate is open (local single-user use).
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    admin_token: Option<String>,
}

impl SessionGate {
    pub fn new(admin_token: Option<String>) -> Self {
        Self {
            admin_token: admin_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.admin_token.is_some()
    }

    /// `header` is the raw `Authorization` value, if any
    pub fn authorize(&self, header: Option<&str>) -> bool {
        let Some(expected) = &self.admin_token else {
            return true;
        };

        header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| constant_time_eq(token.trim().as_bytes(), expected.as_bytes()))
            .unwrap_or(false)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
