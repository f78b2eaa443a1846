//! Post-login navigation rules.

use crate::types::Role;

/// Where users land when nothing else applies.
pub const DEFAULT_ROUTE: &str = "/";

/// Where admins land after login.
pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";

/// Accept only same-origin absolute paths.
///
/// Rejects empty strings, scheme-relative URLs (`//host`), backslash
/// tricks, and anything that is not rooted at `/`.
#[must_use]
pub fn safe_redirect_path(path: &str) -> Option<&str> {
    let valid = path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.chars().any(char::is_control);
    valid.then_some(path)
}

/// Decide where to send a user after a successful login.
///
/// Admins always go to the admin dashboard. Everyone else goes to the
/// stored redirect path if one is set (and safe), otherwise to `/`.
#[must_use]
pub fn post_login_destination<'a>(role: &Role, redirect_path: Option<&'a str>) -> &'a str {
    if role.is_admin() {
        return ADMIN_DASHBOARD;
    }
    redirect_path
        .and_then(safe_redirect_path)
        .unwrap_or(DEFAULT_ROUTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_ignores_redirect_path() {
        let admin = Role::new("admin");
        assert_eq!(post_login_destination(&admin, None), ADMIN_DASHBOARD);
        assert_eq!(
            post_login_destination(&admin, Some("/checkout")),
            ADMIN_DASHBOARD
        );
    }

    #[test]
    fn test_customer_uses_redirect_path() {
        let customer = Role::new("customer");
        assert_eq!(
            post_login_destination(&customer, Some("/checkout")),
            "/checkout"
        );
        assert_eq!(post_login_destination(&customer, None), DEFAULT_ROUTE);
    }

    #[test]
    fn test_missing_role_is_not_admin() {
        assert_eq!(
            post_login_destination(&Role::default(), Some("/cart")),
            "/cart"
        );
    }

    #[test]
    fn test_unsafe_redirects_fall_back_to_default() {
        let customer = Role::new("customer");
        for path in ["", "https://evil.example", "//evil.example", "/\\evil", "cart"] {
            assert_eq!(post_login_destination(&customer, Some(path)), DEFAULT_ROUTE);
        }
    }

    #[test]
    fn test_safe_redirect_keeps_query() {
        assert_eq!(
            safe_redirect_path("/checkout?step=1"),
            Some("/checkout?step=1")
        );
    }
}
