//! Validation of inbound payloads.
//!
//! Every validator decodes, normalizes, then runs an explicit list of rule
//! functions. Shape problems are [`AppError::Decode`]; missing or empty fields
//! are [`AppError::Validation`].

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Content, PreBanner, PreUser};

pub const MIN_LEN_LOGIN: usize = 1;
pub const MAX_LEN_LOGIN: usize = 25;
pub const MIN_LEN_PASSWORD: usize = 6;

/// A rule reports what is wrong with a value, if anything.
pub type Rule<T> = fn(&T) -> Result<(), String>;

/// Run all rules and collect every complaint into one validation error.
pub fn apply_rules<T>(value: &T, rules: &[Rule<T>]) -> Result<(), AppError> {
    let problems: Vec<String> = rules.iter().filter_map(|rule| rule(value).err()).collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(problems.join("; ")))
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawContent {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Banner payload as sent; every field optional so absence can be reported as
/// a validation failure instead of a decode failure.
#[derive(Debug, Default, Deserialize)]
struct RawPreBanner {
    #[serde(default)]
    tag_ids: Option<Vec<i64>>,
    #[serde(default)]
    feature_id: Option<i64>,
    #[serde(default)]
    content: Option<RawContent>,
    #[serde(default)]
    is_active: Option<bool>,
}

impl RawPreBanner {
    fn trim(&mut self) {
        if let Some(content) = self.content.as_mut() {
            for field in [&mut content.title, &mut content.text, &mut content.url] {
                if let Some(value) = field.as_mut() {
                    *value = value.trim().to_string();
                }
            }
        }
    }

    fn into_pre_banner(self) -> Option<PreBanner> {
        let content = self.content?;
        Some(PreBanner {
            tag_ids: self.tag_ids?,
            feature_id: self.feature_id?,
            content: Content {
                title: content.title?,
                text: content.text?,
                url: content.url?,
            },
            is_active: self.is_active?,
        })
    }
}

fn non_empty(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

fn tag_ids_required(b: &RawPreBanner) -> Result<(), String> {
    match &b.tag_ids {
        Some(ids) if !ids.is_empty() => Ok(()),
        _ => Err("tag_ids is required".to_string()),
    }
}

fn tag_ids_positive(b: &RawPreBanner) -> Result<(), String> {
    match &b.tag_ids {
        Some(ids) if ids.iter().any(|&id| id <= 0) => {
            Err("tag_ids must be positive ids".to_string())
        }
        _ => Ok(()),
    }
}

fn feature_id_required(b: &RawPreBanner) -> Result<(), String> {
    match b.feature_id {
        Some(id) if id > 0 => Ok(()),
        _ => Err("feature_id is required".to_string()),
    }
}

fn title_required(b: &RawPreBanner) -> Result<(), String> {
    if non_empty(b.content.as_ref().and_then(|c| c.title.as_ref())) {
        Ok(())
    } else {
        Err("content.title is required".to_string())
    }
}

fn text_required(b: &RawPreBanner) -> Result<(), String> {
    if non_empty(b.content.as_ref().and_then(|c| c.text.as_ref())) {
        Ok(())
    } else {
        Err("content.text is required".to_string())
    }
}

fn url_required(b: &RawPreBanner) -> Result<(), String> {
    if non_empty(b.content.as_ref().and_then(|c| c.url.as_ref())) {
        Ok(())
    } else {
        Err("content.url is required".to_string())
    }
}

fn is_active_required(b: &RawPreBanner) -> Result<(), String> {
    b.is_active
        .map(|_| ())
        .ok_or_else(|| "is_active is required".to_string())
}

const PRE_BANNER_RULES: &[Rule<RawPreBanner>] = &[
    tag_ids_required,
    tag_ids_positive,
    feature_id_required,
    title_required,
    text_required,
    url_required,
    is_active_required,
];

/// Decode, trim and check a banner payload.
pub fn validate_pre_banner(body: &[u8]) -> Result<PreBanner, AppError> {
    let mut raw: RawPreBanner = serde_json::from_slice(body)?;
    raw.trim();

    apply_rules(&raw, PRE_BANNER_RULES)?;

    raw.into_pre_banner()
        .ok_or_else(|| AppError::Validation("incomplete banner".to_string()))
}

fn login_length(u: &PreUser) -> Result<(), String> {
    let len = u.login.chars().count();
    if (MIN_LEN_LOGIN..=MAX_LEN_LOGIN).contains(&len) {
        Ok(())
    } else {
        Err(format!(
            "login must be {MIN_LEN_LOGIN} to {MAX_LEN_LOGIN} characters long"
        ))
    }
}

fn password_length(u: &PreUser) -> Result<(), String> {
    if u.password.chars().count() >= MIN_LEN_PASSWORD {
        Ok(())
    } else {
        Err(format!(
            "password must be at least {MIN_LEN_PASSWORD} characters long"
        ))
    }
}

const PRE_USER_RULES: &[Rule<PreUser>] = &[login_length, password_length];

/// Decode, trim and check a sign-up payload.
pub fn validate_pre_user(body: &[u8]) -> Result<PreUser, AppError> {
    let pre_user: PreUser = serde_json::from_slice(body)?;
    check_pre_user(pre_user)
}

/// Check sign-in credentials taken from the query string.
pub fn validate_credentials(login: &str, password: &str) -> Result<PreUser, AppError> {
    check_pre_user(PreUser {
        login: login.to_string(),
        password: password.to_string(),
    })
}

fn check_pre_user(mut pre_user: PreUser) -> Result<PreUser, AppError> {
    pre_user.trim();
    apply_rules(&pre_user, PRE_USER_RULES)?;
    Ok(pre_user)
}
