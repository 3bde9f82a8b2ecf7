//! Route authorization guard

use crate::models::user::Role;
use crate::session::SessionSnapshot;

/// Capability a route demands before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    None,
    Authenticated,
    AdminOnly,
    LibrarianOrAdmin,
}

/// Guard decision consumed by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    RedirectToLogin,
    Denied(String),
}

/// Decide whether the session may enter a route.
///
/// Pure and deterministic; safe to call on every navigation. A missing
/// profile (`role == None`) passes the role checks: the profile fetch may
/// still be in flight, and unauthenticated access was already ruled out.
pub fn evaluate(session: &SessionSnapshot, requirement: Requirement) -> Access {
    if requirement == Requirement::None {
        return Access::Allow;
    }
    if !session.is_authenticated {
        return Access::RedirectToLogin;
    }
    match requirement {
        Requirement::AdminOnly => match session.role {
            Some(Role::Admin) | None => Access::Allow,
            Some(_) => Access::Denied("Admin access required".to_string()),
        },
        Requirement::LibrarianOrAdmin => match session.role {
            Some(Role::Admin) | Some(Role::Librarian) | None => Access::Allow,
            Some(_) => {
                Access::Denied("Only librarians and admins can access this page".to_string())
            }
        },
        Requirement::None | Requirement::Authenticated => Access::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(authenticated: bool, role: Option<Role>) -> SessionSnapshot {
        SessionSnapshot {
            is_authenticated: authenticated,
            role,
        }
    }

    #[test]
    fn unauthenticated_is_redirected_regardless_of_role() {
        for role in [None, Some(Role::Member), Some(Role::Admin)] {
            assert_eq!(
                evaluate(&session(false, role), Requirement::Authenticated),
                Access::RedirectToLogin
            );
        }
    }

    #[test]
    fn open_routes_never_redirect() {
        assert_eq!(
            evaluate(&session(false, None), Requirement::None),
            Access::Allow
        );
    }

    #[test]
    fn member_is_denied_admin_routes() {
        let access = evaluate(&session(true, Some(Role::Member)), Requirement::AdminOnly);
        assert!(matches!(access, Access::Denied(_)));
    }

    #[test]
    fn admin_is_allowed_admin_routes() {
        assert_eq!(
            evaluate(&session(true, Some(Role::Admin)), Requirement::AdminOnly),
            Access::Allow
        );
    }

    #[test]
    fn librarian_passes_librarian_or_admin_but_member_does_not() {
        assert_eq!(
            evaluate(
                &session(true, Some(Role::Librarian)),
                Requirement::LibrarianOrAdmin
            ),
            Access::Allow
        );
        assert!(matches!(
            evaluate(
                &session(true, Some(Role::Member)),
                Requirement::LibrarianOrAdmin
            ),
            Access::Denied(_)
        ));
    }

    #[test]
    fn missing_profile_passes_role_checks() {
        assert_eq!(
            evaluate(&session(true, None), Requirement::AdminOnly),
            Access::Allow
        );
    }

    #[test]
    fn authenticated_requirement_ignores_role() {
        assert_eq!(
            evaluate(&session(true, Some(Role::Member)), Requirement::Authenticated),
            Access::Allow
        );
    }
}
