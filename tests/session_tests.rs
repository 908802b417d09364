use chrono::{TimeZone, Utc};
use resource_ledger::session::encode_unsigned_token;
use resource_ledger::{Capability, Claims, Role, Session, SessionError};

fn token(role: Role, exp: Option<i64>) -> String {
    encode_unsigned_token(&Claims {
        sub: "finance@example.test".into(),
        role,
        exp,
    })
}

#[test]
fn admin_may_manage_everything() {
    let session = Session::from_bearer(&format!("Bearer {}", token(Role::Admin, None))).unwrap();
    assert_eq!(session.role(), Role::Admin);
    assert_eq!(session.subject(), "finance@example.test");
    for capability in [
        Capability::ViewBudgets,
        Capability::ManageClients,
        Capability::ManageProjects,
        Capability::ManageRateCards,
        Capability::ManageStaffing,
    ] {
        assert!(session.require(capability).is_ok());
    }
}

#[test]
fn token_lapses_at_its_expiry_instant() {
    let exp = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let session = Session::from_bearer(&token(Role::User, Some(exp.timestamp()))).unwrap();
    assert_eq!(session.claims().exp, Some(exp.timestamp()));
    let before = Utc.with_ymd_and_hms(2025, 6, 1, 11, 59, 59).unwrap();
    assert!(session.ensure_active(before).is_ok());
    assert_eq!(session.ensure_active(exp), Err(SessionError::Expired(exp)));
}

#[test]
fn malformed_tokens_are_rejected() {
    assert_eq!(Session::from_bearer("Bearer "), Err(SessionError::MissingToken));
    assert!(matches!(
        Session::from_bearer("only.two"),
        Err(SessionError::MalformedToken(_))
    ));
    assert_eq!(Session::from_bearer("bearer"), Err(SessionError::MissingToken));
    assert!(matches!(
        Session::from_bearer("a.@@@.c"),
        Err(SessionError::MalformedToken(_))
    ));
    assert!(matches!(
        Session::from_bearer("a.e30.c"),
        Err(SessionError::MalformedToken(_))
    ));
}
