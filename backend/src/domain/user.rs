//! User directory data model.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use utoipa::ToSchema;
use uuid::Uuid;

use super::course::CourseId;

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyDisplayName,
    DisplayNameTooShort { min: usize },
    DisplayNameTooLong { max: usize },
    DisplayNameInvalidCharacters,
    InvalidEmail,
    UnknownRole { value: String },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
            Self::DisplayNameTooShort { min } => {
                write!(f, "display name must be at least {min} characters")
            }
            Self::DisplayNameTooLong { max } => {
                write!(f, "display name must be at most {max} characters")
            }
            Self::DisplayNameInvalidCharacters => write!(
                f,
                "display name may only contain letters, numbers, spaces, or underscores",
            ),
            Self::InvalidEmail => write!(f, "email address is not well formed"),
            Self::UnknownRole { value } => write!(f, "unknown role: {value}"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

/// Minimum allowed length for a display name.
pub const DISPLAY_NAME_MIN: usize = 3;
/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 32;

static DISPLAY_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn display_name_regex() -> &'static Regex {
    DISPLAY_NAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        let pattern = "^[A-Za-z0-9_ ]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("display name regex failed to compile: {error}"))
    })
}

impl DisplayName {
    /// Validate and construct a [`DisplayName`] from owned input.
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(display_name.into())
    }

    fn from_owned(display_name: String) -> Result<Self, UserValidationError> {
        if display_name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }

        let length = display_name.chars().count();
        if length < DISPLAY_NAME_MIN {
            return Err(UserValidationError::DisplayNameTooShort {
                min: DISPLAY_NAME_MIN,
            });
        }
        if length > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }

        if !display_name_regex().is_match(&display_name) {
            return Err(UserValidationError::DisplayNameInvalidCharacters);
        }

        Ok(Self(display_name))
    }

    /// Split into given and family parts on the first space.
    ///
    /// Merged enrollment views expose `firstName`/`lastName` fields derived
    /// from the single display name; a name without a space yields an empty
    /// family part.
    pub fn split_parts(&self) -> (&str, &str) {
        match self.0.split_once(' ') {
            Some((given, family)) => (given, family),
            None => (self.0.as_str(), ""),
        }
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Validated email address.
///
/// The check is structural (one `@`, non-empty local and domain parts, a dot
/// in the domain, no whitespace); deliverability is out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, UserValidationError> {
        if email.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        let Some((local, domain)) = email.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(UserValidationError::InvalidEmail);
        }
        let Some((host, tld)) = domain.rsplit_once('.') else {
            return Err(UserValidationError::InvalidEmail);
        };
        if host.is_empty() || tld.is_empty() {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Platform role attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Enrols in courses and submits quiz attempts.
    Student,
    /// Owns courses and decides enrollment requests.
    Teacher,
    /// Passes every access check.
    Admin,
}

impl Role {
    /// Stable string form used in storage and wire payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directory record for a platform user.
///
/// ## Invariants
/// - `id` must be a valid UUID string.
/// - `display_name` and `email` satisfy their value-type validation.
/// - `enrolled_course_ids` is the legacy membership list: the ordered set of
///   courses the user is considered accepted into. It is owned by the user
///   record but mutated exclusively through the enrollment workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "UserDto", into = "UserDto")]
pub struct User {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: UserId,
    #[schema(value_type = String, example = "Ada Lovelace")]
    display_name: DisplayName,
    #[schema(value_type = String, example = "ada@example.com")]
    email: EmailAddress,
    role: Role,
    #[schema(value_type = Vec<String>)]
    enrolled_course_ids: Vec<CourseId>,
}

impl User {
    /// Build a new [`User`] from validated components.
    pub fn new(id: UserId, display_name: DisplayName, email: EmailAddress, role: Role) -> Self {
        Self {
            id,
            display_name,
            email,
            role,
            enrolled_course_ids: Vec::new(),
        }
    }

    /// Replace the legacy membership list wholesale.
    ///
    /// Only persistence adapters and test fixtures should need this; all
    /// business mutation flows through the enrollment workflow.
    pub fn with_enrolled_courses(mut self, courses: Vec<CourseId>) -> Self {
        self.enrolled_course_ids = courses;
        self
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Display name shown to other users.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Contact email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Platform role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Legacy membership list (course ids the user is accepted into).
    pub fn enrolled_course_ids(&self) -> &[CourseId] {
        &self.enrolled_course_ids
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    id: String,
    display_name: String,
    email: String,
    role: Role,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    enrolled_course_ids: Vec<CourseId>,
}

impl From<User> for UserDto {
    fn from(value: User) -> Self {
        let User {
            id,
            display_name,
            email,
            role,
            enrolled_course_ids,
        } = value;
        Self {
            id: id.to_string(),
            display_name: display_name.into(),
            email: email.into(),
            role,
            enrolled_course_ids,
        }
    }
}

impl TryFrom<UserDto> for User {
    type Error = UserValidationError;

    fn try_from(value: UserDto) -> Result<Self, Self::Error> {
        let UserDto {
            id,
            display_name,
            email,
            role,
            enrolled_course_ids,
        } = value;
        Ok(
            User::new(
                UserId::new(id)?,
                DisplayName::new(display_name)?,
                EmailAddress::new(email)?,
                role,
            )
            .with_enrolled_courses(enrolled_course_ids),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case("not-a-uuid", UserValidationError::InvalidId)]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
    fn user_id_rejects_malformed_input(#[case] raw: &str, #[case] expected: UserValidationError) {
        let err = UserId::new(raw).expect_err("malformed id rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn user_id_round_trips() {
        let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
        assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[rstest]
    #[case("Ada Lovelace", "Ada", "Lovelace")]
    #[case("Ada Byron Lovelace", "Ada", "Byron Lovelace")]
    #[case("Plato", "Plato", "")]
    fn display_name_splits_on_first_space(
        #[case] name: &str,
        #[case] given: &str,
        #[case] family: &str,
    ) {
        let display_name = DisplayName::new(name).expect("valid name");
        assert_eq!(display_name.split_parts(), (given, family));
    }

    #[rstest]
    #[case("ab")]
    #[case("bad$char")]
    fn display_name_rejects_invalid_input(#[case] name: &str) {
        assert!(DisplayName::new(name).is_err());
    }

    #[rstest]
    #[case("ada@example.com", true)]
    #[case("a@b.co", true)]
    #[case("no-at-sign", false)]
    #[case("@example.com", false)]
    #[case("ada@nodot", false)]
    #[case("ada @example.com", false)]
    fn email_validation_cases(#[case] email: &str, #[case] valid: bool) {
        assert_eq!(EmailAddress::new(email).is_ok(), valid);
    }

    #[rstest]
    #[case("student", Role::Student)]
    #[case("teacher", Role::Teacher)]
    #[case("admin", Role::Admin)]
    fn role_parses_stable_strings(#[case] raw: &str, #[case] expected: Role) {
        let role: Role = raw.parse().expect("known role");
        assert_eq!(role, expected);
        assert_eq!(role.as_str(), raw);
    }

    #[rstest]
    fn role_rejects_unknown_strings() {
        let err = "superuser".parse::<Role>().expect_err("unknown role");
        assert!(matches!(err, UserValidationError::UnknownRole { .. }));
    }

    #[rstest]
    fn user_serialises_camel_case() {
        let user = User::new(
            UserId::random(),
            DisplayName::new("Ada Lovelace").expect("valid name"),
            EmailAddress::new("ada@example.com").expect("valid email"),
            Role::Student,
        );
        let value = serde_json::to_value(&user).expect("user serialises");
        assert!(value.get("displayName").is_some());
        assert!(value.get("display_name").is_none());
        assert_eq!(
            value.get("role"),
            Some(&serde_json::Value::String("student".into()))
        );
    }
}
