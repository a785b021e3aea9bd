//! User fixtures.
//!
//! Society 7 has a society admin and a pramukh. Building 42 belongs to
//! society 9 and has a building admin and a member. Every fixture user has
//! the password [`TEST_PASSWORD`].

use sc_service::models::{Role, UserRecord};
use std::sync::OnceLock;

pub const TEST_PASSWORD: &str = "correct horse battery staple";

pub const SOCIETY_ID: i64 = 7;
pub const OTHER_SOCIETY_ID: i64 = 9;
pub const BUILDING_ID: i64 = 42;
/// Building in society 7.
pub const OWNED_BUILDING_ID: i64 = 15;

pub const SOCIETY_ADMIN_ID: i64 = 11;
pub const PRAMUKH_ID: i64 = 12;
pub const BUILDING_ADMIN_ID: i64 = 21;
pub const MEMBER_ID: i64 = 22;
pub const INACTIVE_MEMBER_ID: i64 = 23;

/// Bcrypt hash of [`TEST_PASSWORD`] at the minimum cost, computed once.
pub fn test_password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| bcrypt::hash(TEST_PASSWORD, 4).unwrap())
        .clone()
}

/// Build a user record with the fixture password.
pub fn user_record(
    id: i64,
    email: &str,
    role: &str,
    society_id: Option<i64>,
    building_id: Option<i64>,
    status: &str,
) -> UserRecord {
    UserRecord {
        id,
        name: format!("User {id}"),
        email: email.to_string(),
        password_hash: test_password_hash(),
        role: role.to_string(),
        society_id,
        building_id,
        status: status.to_string(),
    }
}

pub fn society_admin() -> UserRecord {
    user_record(
        SOCIETY_ADMIN_ID,
        "admin@society.test",
        Role::SocietyAdmin.as_str(),
        Some(SOCIETY_ID),
        None,
        "active",
    )
}

pub fn pramukh() -> UserRecord {
    user_record(
        PRAMUKH_ID,
        "pramukh@society.test",
        Role::SocietyPramukh.as_str(),
        Some(SOCIETY_ID),
        None,
        "active",
    )
}

pub fn building_admin() -> UserRecord {
    user_record(
        BUILDING_ADMIN_ID,
        "badmin@society.test",
        Role::BuildingAdmin.as_str(),
        Some(OTHER_SOCIETY_ID),
        Some(BUILDING_ID),
        "active",
    )
}

pub fn member() -> UserRecord {
    user_record(
        MEMBER_ID,
        "member@society.test",
        Role::Member.as_str(),
        Some(OTHER_SOCIETY_ID),
        Some(BUILDING_ID),
        "active",
    )
}

pub fn inactive_member() -> UserRecord {
    user_record(
        INACTIVE_MEMBER_ID,
        "gone@society.test",
        Role::Member.as_str(),
        Some(OTHER_SOCIETY_ID),
        Some(BUILDING_ID),
        "inactive",
    )
}

/// All fixture users.
pub fn all_users() -> Vec<UserRecord> {
    vec![
        society_admin(),
        pramukh(),
        building_admin(),
        member(),
        inactive_member(),
    ]
}
