use crate::identity::Profile;

const ANONYMOUS: &str = "Anonymous";

/// Display label for a comment author.
///
/// Preference order: display name, then the local part of the email, then
/// `"Anonymous"`. Blank values are skipped.
pub fn author_label(profile: Option<&Profile>) -> String {
    let Some(profile) = profile else {
        return ANONYMOUS.to_string();
    };

    if let Some(name) = profile.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    profile
        .email
        .split('@')
        .next()
        .map(str::trim)
        .filter(|local| !local.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile(email: &str, name: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn prefers_display_name() {
        assert_eq!(author_label(Some(&profile("ann@x.com", Some("Ann")))), "Ann");
    }

    #[test]
    fn falls_back_to_email_local_part() {
        assert_eq!(author_label(Some(&profile("ann@x.com", None))), "ann");
        assert_eq!(author_label(Some(&profile("ann@x.com", Some("  ")))), "ann");
    }

    #[test]
    fn falls_back_to_anonymous() {
        assert_eq!(author_label(None), "Anonymous");
        assert_eq!(author_label(Some(&profile("", None))), "Anonymous");
        assert_eq!(author_label(Some(&profile("@x.com", None))), "Anonymous");
    }
}
