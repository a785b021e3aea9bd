use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Login page; unauthenticated browser requests land here.
pub const LOGIN_PATH: &str = "/auth/login";

/// Forced logout; invalid scope and unknown roles are sent here.
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Fixed, closed set of roles.
///
/// Society-level roles carry a `society_id`, building-level roles carry a
/// `building_id`. There is no inheritance between roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SocietyAdmin,
    SocietyPramukh,
    BuildingAdmin,
    Member,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::SocietyAdmin,
        Role::SocietyPramukh,
        Role::BuildingAdmin,
        Role::Member,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SocietyAdmin => "society_admin",
            Role::SocietyPramukh => "society_pramukh",
            Role::BuildingAdmin => "building_admin",
            Role::Member => "member",
        }
    }

    /// Default landing page for the role.
    ///
    /// This table is a public contract for clients integrating against the app.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Role::SocietyAdmin => "/admin/dashboard",
            Role::SocietyPramukh => "/pramukh/dashboard",
            Role::BuildingAdmin => "/building/dashboard",
            Role::Member => "/member/dashboard",
        }
    }

    pub fn is_society_level(&self) -> bool {
        SOCIETY_ROLES.contains(*self)
    }

    pub fn is_building_level(&self) -> bool {
        BUILDING_ROLES.contains(*self)
    }

    const fn bit(self) -> u8 {
        match self {
            Role::SocietyAdmin => 1,
            Role::SocietyPramukh => 1 << 1,
            Role::BuildingAdmin => 1 << 2,
            Role::Member => 1 << 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "society_admin" => Ok(Role::SocietyAdmin),
            "society_pramukh" => Ok(Role::SocietyPramukh),
            "building_admin" => Ok(Role::BuildingAdmin),
            "member" => Ok(Role::Member),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Allow-list of roles, matched by exact membership.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const fn empty() -> Self {
        RoleSet(0)
    }

    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0u8;
        let mut rest = roles;
        while let [first, tail @ ..] = rest {
            bits |= first.bit();
            rest = tail;
        }
        RoleSet(bits)
    }

    pub const fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> {
        let set = *self;
        Role::ALL.into_iter().filter(move |r| set.contains(*r))
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|r| r.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}

pub const SOCIETY_ROLES: RoleSet = RoleSet::of(&[Role::SocietyAdmin, Role::SocietyPramukh]);
pub const BUILDING_ROLES: RoleSet = RoleSet::of(&[Role::BuildingAdmin, Role::Member]);

/// Account status. Anything other than "active" is treated as inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn parse(s: &str) -> Self {
        if s == "active" {
            UserStatus::Active
        } else {
            UserStatus::Inactive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }
}

/// User row as returned by the user lookup (maps to users table).
///
/// `password_hash` never leaves the login path; Debug redacts it.
#[derive(Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub society_id: Option<i64>,
    pub building_id: Option<i64>,
    pub status: String,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("society_id", &self.society_id)
            .field("building_id", &self.building_id)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// User snapshot stored in the session at login (password hash stripped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub society_id: Option<i64>,
    pub building_id: Option<i64>,
    pub status: UserStatus,
}

impl TryFrom<UserRecord> for SessionUser {
    type Error = String;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let role = Role::from_str(&record.role)?;
        Ok(SessionUser {
            id: record.id,
            name: record.name,
            email: record.email,
            role,
            society_id: record.society_id,
            building_id: record.building_id,
            status: UserStatus::parse(&record.status),
        })
    }
}

/// Society id proven by the scope guard.
///
/// Only the access service constructs this, from the session snapshot, so a
/// tenant-scoped query can never be fed a client-supplied id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocietyScope(i64);

impl SocietyScope {
    pub(crate) fn new(id: i64) -> Self {
        SocietyScope(id)
    }

    pub fn id(&self) -> i64 {
        self.0
    }
}

/// Building id proven by the scope guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildingScope(i64);

impl BuildingScope {
    pub(crate) fn new(id: i64) -> Self {
        BuildingScope(id)
    }

    pub fn id(&self) -> i64 {
        self.0
    }
}

/// Tenant that owns a fund ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FundScope {
    Society(SocietyScope),
    Building(BuildingScope),
}

/// Fund ledger entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundEntryType {
    Income,
    Expense,
    UseMoney,
}

impl FundEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundEntryType::Income => "income",
            FundEntryType::Expense => "expense",
            FundEntryType::UseMoney => "use_money",
        }
    }

    /// Signed change this entry applies to the running total.
    pub fn delta(&self, amount_cents: i64) -> i64 {
        match self {
            FundEntryType::Income => amount_cents,
            FundEntryType::Expense | FundEntryType::UseMoney => -amount_cents,
        }
    }
}

impl FromStr for FundEntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(FundEntryType::Income),
            "expense" => Ok(FundEntryType::Expense),
            "use_money" => Ok(FundEntryType::UseMoney),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

impl TryFrom<String> for FundEntryType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FundEntryType::from_str(&value)
    }
}

/// Validated fund entry, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFundEntry {
    pub amount_cents: i64,
    pub entry_type: FundEntryType,
    pub description: String,
    pub entry_date: NaiveDate,
}

/// Fund ledger row (maps to society_fund / building_fund tables)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FundEntry {
    pub id: i64,
    pub amount_cents: i64,
    #[sqlx(try_from = "String")]
    pub entry_type: FundEntryType,
    pub description: String,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Building row (maps to buildings table)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Building {
    pub id: i64,
    pub society_id: i64,
    pub building_name: String,
    pub fund_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Meeting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingLevel {
    Society,
    Building,
}

impl MeetingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingLevel::Society => "society",
            MeetingLevel::Building => "building",
        }
    }
}

impl TryFrom<String> for MeetingLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "society" => Ok(MeetingLevel::Society),
            "building" => Ok(MeetingLevel::Building),
            _ => Err(format!("Invalid meeting level: {}", value)),
        }
    }
}

/// Meeting row (maps to meetings table)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Meeting {
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub level: MeetingLevel,
    pub society_id: Option<i64>,
    pub building_id: Option<i64>,
    pub title: String,
    pub meeting_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Meeting to be created. `building_id` is set only for building-level meetings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMeeting {
    pub level: MeetingLevel,
    pub society_id: Option<i64>,
    pub building_id: Option<i64>,
    pub title: String,
    pub meeting_date: NaiveDate,
}
