/// Fixed destination project for agents whose owner has been deleted.
/// Exists for the lifetime of the system and is never deletable because it
/// is an identifier, not a row.
pub const ORPHANED_PROJECT_ID: &str = "proj_orphaned";

/// Root admin seeded by the initial migration. Orphaned agents are
/// reassigned to this user.
pub const SYSTEM_OWNER_USER_ID: &str = "user_system";

pub const SYSTEM_OWNER_USERNAME: &str = "system";

/// Default project for freshly created agents.
pub const DEFAULT_PROJECT_ID: &str = "proj_default";

/// Tag appended to every agent swept by a delete cascade.
pub const ORPHANED_TAG: &str = "orphaned";

/// Tag prefix recording the agent's owner before the cascade.
pub const ORIGINAL_OWNER_TAG_PREFIX: &str = "original-owner:";

/// Review note written on budget requests auto-cancelled by a delete cascade.
pub const AUTO_CANCELLED_NOTE: &str = "Auto-cancelled: user deleted";

pub mod limits {

    pub const MAX_USERNAME_LEN: usize = 255;

    pub const MAX_EMAIL_LEN: usize = 255;

    pub const MIN_PASSWORD_LEN: usize = 8;

    pub const MAX_PASSWORD_LEN: usize = 1000;

    pub const DEFAULT_PAGE_SIZE: u64 = 50;

    pub const MAX_PAGE_SIZE: u64 = 100;
}
