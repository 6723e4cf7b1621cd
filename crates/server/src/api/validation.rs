// Input validation for public APIs
//
// Every request body is trimmed and checked here before it reaches a service.
// Messages are user-facing and mirror the wording the web client displays.
// Registration collects every failure; other forms stop at the first one.

use regex::Regex;
use spicescape_core::AppError;
use std::sync::OnceLock;

// =============================================================================
// Patterns
// =============================================================================

fn alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("static regex is valid"))
}

/// Letters, digits, space and basic punctuation
fn prose() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^[a-zA-Z0-9 \-,.!?'":;()]+$"#).expect("static regex is valid")
    })
}

fn email() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^\s@<>()\[\],;:]+@([a-zA-Z0-9\-]+\.)+[a-zA-Z]{2,}$")
            .expect("static regex is valid")
    })
}

/// base64 data URI, e.g. `data:image/png;base64,iVBOR...`
fn data_uri() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^data:[a-zA-Z0-9!#$&^_.+\-]+/[a-zA-Z0-9!#$&^_.+\-]+(;[a-zA-Z0-9\-]+=[a-zA-Z0-9\-]+)*;base64,[A-Za-z0-9+/]+={0,2}$")
            .expect("static regex is valid")
    })
}

// =============================================================================
// Field rules
// =============================================================================

/// Messages and limits for one string field
struct TextRule {
    pattern: fn() -> &'static Regex,
    pattern_message: &'static str,
    empty_message: &'static str,
    required_message: &'static str,
    min: usize,
    min_message: &'static str,
    max: usize,
    max_message: &'static str,
}

impl TextRule {
    /// Trim and check a value; returns the trimmed value or the first failing message
    fn check(&self, value: Option<&str>) -> Result<String, &'static str> {
        let value = value.ok_or(self.required_message)?.trim();
        if value.is_empty() {
            return Err(self.empty_message);
        }
        if !(self.pattern)().is_match(value) {
            return Err(self.pattern_message);
        }
        let len = value.chars().count();
        if len < self.min {
            return Err(self.min_message);
        }
        if len > self.max {
            return Err(self.max_message);
        }
        Ok(value.to_string())
    }
}

const USERNAME: TextRule = TextRule {
    pattern: alphanumeric,
    pattern_message: "Only alphanumeric characters are allowed.",
    empty_message: "Please enter a username",
    required_message: "Username is required",
    min: 6,
    min_message: "Username should have at least 6 characters",
    max: 16,
    max_message: "Username should have at most 16 characters",
};

const PASSWORD: TextRule = TextRule {
    pattern: alphanumeric,
    pattern_message: "Only alphanumeric characters are allowed.",
    empty_message: "Please enter a password",
    required_message: "Password is required",
    min: 8,
    min_message: "Password should have at least 8 characters",
    max: 16,
    max_message: "Password should have at most 16 characters",
};

const BIOGRAPHY: TextRule = TextRule {
    pattern: prose,
    pattern_message: "Special characters are not allowed.",
    empty_message: "Please enter a biography",
    required_message: "A bio for your profile is required",
    min: 49,
    min_message: "Biography should have at least 49 characters",
    max: 250,
    max_message: "Biography should have at most 250 characters",
};

const RECIPE_TITLE: TextRule = TextRule {
    pattern: prose,
    pattern_message: "Special characters are not allowed.",
    empty_message: "Please enter a title for your recipe",
    required_message: "A title for your recipe is required",
    min: 3,
    min_message: "Recipe title should have at least 3 characters",
    max: 211,
    max_message: "Recipe title should have at most 211 characters",
};

const RECIPE_DESCRIPTION: TextRule = TextRule {
    pattern: prose,
    pattern_message: "Special characters are not allowed.",
    empty_message: "Please enter a description for your recipe",
    required_message: "A description for your recipe is required",
    min: 100,
    min_message: "Recipe description should have at least 100 characters",
    max: 800,
    max_message: "Recipe description should have at most 800 characters",
};

const RECIPE_INGREDIENTS: TextRule = TextRule {
    pattern: prose,
    pattern_message: "Special characters are not allowed.",
    empty_message: "Please provide the ingredients for your recipe",
    required_message: "Ingredients for your recipe are required",
    min: 100,
    min_message: "Recipe ingredients should have at least 100 characters",
    max: 800,
    max_message: "Recipe ingredients should have at most 800 characters",
};

const RECIPE_STEPS: TextRule = TextRule {
    pattern: prose,
    pattern_message: "Special characters are not allowed.",
    empty_message: "Please provide steps for your recipe",
    required_message: "Steps for your recipe are required",
    min: 100,
    min_message: "Recipe steps should have at least 100 characters",
    max: 800,
    max_message: "Recipe steps should have at most 800 characters",
};

const COMMENT_TEXT: TextRule = TextRule {
    pattern: prose,
    pattern_message: "Special characters are not allowed.",
    empty_message: "Please provide text for your comment",
    required_message: "Text for your comment is required",
    min: 3,
    min_message: "Comment should have at least 3 characters",
    max: 150,
    max_message: "Comment should have at most 150 characters",
};

fn check_email(value: Option<&str>) -> Result<String, &'static str> {
    let value = value.ok_or("Email is required")?.trim();
    if value.is_empty() {
        return Err("Please enter an email");
    }
    if !email().is_match(value) {
        return Err("Please enter a valid email");
    }
    Ok(value.to_lowercase())
}

fn check_data_uri(
    value: Option<&str>,
    required_message: &'static str,
) -> Result<String, &'static str> {
    let value = value.ok_or(required_message)?.trim();
    if value.is_empty() || !data_uri().is_match(value) {
        return Err("Please provide a valid data Uri");
    }
    Ok(value.to_string())
}

fn first_error<T>(result: Result<T, &'static str>) -> Result<T, AppError> {
    result.map_err(AppError::bad_request)
}

// =============================================================================
// Validated forms
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Validate a registration form, reporting every failing field
pub fn validate_registration(
    username: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<Registration, AppError> {
    let username = USERNAME.check(username);
    let email = check_email(email);
    let password = PASSWORD.check(password);

    match (username, email, password) {
        (Ok(username), Ok(email), Ok(password)) => Ok(Registration {
            username,
            email,
            password,
        }),
        (username, email, password) => {
            let messages = [username.err(), email.err(), password.err()]
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect();
            Err(AppError::Validation(messages))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn validate_login(email: Option<&str>, password: Option<&str>) -> Result<Credentials, AppError> {
    Ok(Credentials {
        email: first_error(check_email(email))?,
        password: first_error(PASSWORD.check(password))?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRevision {
    pub username: String,
    pub biography: String,
    pub profile_image: String,
}

pub fn validate_profile_revision(
    username: Option<&str>,
    biography: Option<&str>,
    profile_image: Option<&str>,
) -> Result<ProfileRevision, AppError> {
    Ok(ProfileRevision {
        username: first_error(USERNAME.check(username))?,
        biography: first_error(BIOGRAPHY.check(biography))?,
        profile_image: first_error(check_data_uri(
            profile_image,
            "An image for your user profile is required",
        ))?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeForm {
    pub title: String,
    pub description: String,
    pub ingredients: String,
    pub steps: String,
    /// Data URI of a new image; None keeps the default (create) or current (edit) image
    pub image: Option<String>,
}

pub fn validate_recipe(
    title: Option<&str>,
    description: Option<&str>,
    ingredients: Option<&str>,
    steps: Option<&str>,
    image: Option<&str>,
) -> Result<RecipeForm, AppError> {
    let image = match image {
        Some(uri) => Some(first_error(check_data_uri(
            Some(uri),
            "An image for your recipe is required",
        ))?),
        None => None,
    };

    Ok(RecipeForm {
        title: first_error(RECIPE_TITLE.check(title))?,
        description: first_error(RECIPE_DESCRIPTION.check(description))?,
        ingredients: first_error(RECIPE_INGREDIENTS.check(ingredients))?,
        steps: first_error(RECIPE_STEPS.check(steps))?,
        image,
    })
}

pub fn validate_comment_text(text: Option<&str>) -> Result<String, AppError> {
    first_error(COMMENT_TEXT.check(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_TEXT: &str = "Whisk the eggs with sugar until pale, fold in the flour, \
        then bake in a hot oven for twenty minutes until golden brown.";

    #[test]
    fn test_registration_valid() {
        let reg =
            validate_registration(Some(" chefAlice "), Some("Alice@Example.com"), Some("Abcd1234"))
                .unwrap();
        assert_eq!(reg.username, "chefAlice");
        assert_eq!(reg.email, "alice@example.com");
        assert_eq!(reg.password, "Abcd1234");
    }

    #[test]
    fn test_registration_reports_all_errors() {
        let err = validate_registration(Some("abc"), Some("not-an-email"), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Username should have at least 6 characters,Please enter a valid email,Password is required"
        );
    }

    #[test]
    fn test_username_rules() {
        assert_eq!(
            USERNAME.check(Some("chef alice")),
            Err("Only alphanumeric characters are allowed.")
        );
        assert_eq!(USERNAME.check(Some("   ")), Err("Please enter a username"));
        assert_eq!(
            USERNAME.check(Some("abcdefghijklmnopq")),
            Err("Username should have at most 16 characters")
        );
    }

    #[test]
    fn test_login_first_error_only() {
        let err = validate_login(None, None).unwrap_err();
        assert_eq!(err, AppError::bad_request("Email is required"));
    }

    #[test]
    fn test_profile_revision() {
        let bio = "I cook spicy food every weekend and share what I learn here.";
        let ok = validate_profile_revision(
            Some("chefAlice"),
            Some(bio),
            Some("data:image/png;base64,iVBORw0KGgo="),
        )
        .unwrap();
        assert_eq!(ok.biography, bio);

        let err = validate_profile_revision(Some("chefAlice"), Some("too short"), None).unwrap_err();
        assert_eq!(
            err,
            AppError::bad_request("Biography should have at least 49 characters")
        );

        let err = validate_profile_revision(Some("chefAlice"), Some(bio), Some("http://x/y.png"))
            .unwrap_err();
        assert_eq!(err, AppError::bad_request("Please provide a valid data Uri"));
    }

    #[test]
    fn test_recipe_form() {
        let form = validate_recipe(
            Some("Lemon Cake"),
            Some(LONG_TEXT),
            Some(LONG_TEXT),
            Some(LONG_TEXT),
            None,
        )
        .unwrap();
        assert_eq!(form.title, "Lemon Cake");
        assert!(form.image.is_none());

        let err = validate_recipe(
            Some("Lemon Cake"),
            Some("short"),
            Some(LONG_TEXT),
            Some(LONG_TEXT),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            AppError::bad_request("Recipe description should have at least 100 characters")
        );
    }

    #[test]
    fn test_comment_text() {
        assert_eq!(validate_comment_text(Some("  Yummy!  ")).unwrap(), "Yummy!");
        assert_eq!(
            validate_comment_text(Some("ok")),
            Err(AppError::bad_request("Comment should have at least 3 characters"))
        );
        assert_eq!(
            validate_comment_text(Some("<script>")),
            Err(AppError::bad_request("Special characters are not allowed."))
        );
    }
}
