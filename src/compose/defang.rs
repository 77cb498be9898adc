//! Address defanging for display inside notification bodies.

/// Replace `@` with `[at]` and `.` with `[dot]` so a displayed address is not
/// auto-linked by mail clients.
///
/// `"alice@x.com"` → `"alice[at]x[dot]com"`
pub fn defang(address: &str) -> String {
    address.replace('@', "[at]").replace('.', "[dot]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defang() {
        assert_eq!(defang("alice@x.com"), "alice[at]x[dot]com");
        assert_eq!(
            defang("first.last@mail.example.org"),
            "first[dot]last[at]mail[dot]example[dot]org"
        );
        assert_eq!(defang("postmaster"), "postmaster");
    }
}
