pub mod tokens {

    /// How long an administrator has to act on a freshly registered account.
    pub const VERIFICATION_TTL_HOURS: i64 = 48;

    /// Lifetime of a user-requested (or first-login) password reset token.
    pub const RESET_TTL_HOURS: i64 = 24;

    /// Reset window granted together with admin approval.
    pub const APPROVAL_RESET_TTL_DAYS: i64 = 7;

    /// Lifetime of a signed session token.
    pub const SESSION_TTL_DAYS: i64 = 7;
}

pub mod limits {

    pub const EXTERNAL_ID_MAX_LEN: usize = 50;

    pub const NAME_MAX_LEN: usize = 100;

    pub const EMAIL_MAX_LEN: usize = 100;

    pub const TEMP_PASSWORD_LEN: usize = 12;

    pub const MIN_PASSWORD_LEN: usize = 8;
}
