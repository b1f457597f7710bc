use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::fetch::FetchSink;
use crate::model::{Message, UserDetail, UserProfile};

pub const SLACKBOT_ID: &str = "USLACKBOT";
const SLACKBOT_NAME: &str = "Slackbot";
const SLACKBOT_AVATAR: &str = "avatars/slackbot.png";
pub const PLACEHOLDER_AVATAR: &str = "avatars/unknown.png";

/// Display identities keyed by user id, in registration order.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: IndexMap<String, UserDetail>,
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl UserDirectory {
    pub fn new() -> Self {
        let mut users = IndexMap::new();
        users.insert(
            SLACKBOT_ID.to_string(),
            UserDetail {
                name: SLACKBOT_NAME.to_string(),
                avatar: SLACKBOT_AVATAR.to_string(),
            },
        );
        Self { users }
    }

    /// Registers every user that ships an embedded profile somewhere in `messages`.
    pub fn populate(&mut self, messages: &[Message], sink: &mut impl FetchSink) -> Result<()> {
        for message in messages {
            if let Some(profile) = &message.user_profile {
                self.register(&message.user, profile, sink)?;
            }
        }
        debug!(users = self.users.len(), "user directory populated");
        Ok(())
    }

    /// Returns `false` when the id was already known; the first profile seen wins.
    pub fn register(
        &mut self,
        user_id: &str,
        profile: &UserProfile,
        sink: &mut impl FetchSink,
    ) -> Result<bool> {
        if self.users.contains_key(user_id) {
            return Ok(false);
        }

        let avatar = format!("avatars/{}.jpg", profile.avatar_hash);
        sink.fetch(&profile.image_72, &avatar)?;
        self.users.insert(
            user_id.to_string(),
            UserDetail {
                name: profile.name.clone(),
                avatar,
            },
        );
        Ok(true)
    }

    pub fn get(&self, user_id: &str) -> Result<&UserDetail> {
        self.users
            .get(user_id)
            .ok_or_else(|| ArchiveError::UnknownUser(user_id.to_string()))
    }

    /// Users that never posted with a profile attached show up under their raw id.
    pub fn get_or_placeholder(&self, user_id: &str) -> UserDetail {
        self.get(user_id).cloned().unwrap_or_else(|_| UserDetail {
            name: user_id.to_string(),
            avatar: PLACEHOLDER_AVATAR.to_string(),
        })
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Replaces every known user id in `text` with that user's display name.
    ///
    /// Plain substring replacement: an id embedded in a longer word is replaced as well.
    pub fn substitute_ids(&self, text: &str) -> String {
        let mut output = text.to_string();
        for (user_id, detail) in &self.users {
            if output.contains(user_id.as_str()) {
                output = output.replace(user_id.as_str(), &detail.name);
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use crate::fetch::FetchInstruction;
    use crate::model::{Message, UserProfile};
    use crate::users::{PLACEHOLDER_AVATAR, SLACKBOT_ID, UserDirectory};

    fn profile(name: &str, hash: &str) -> UserProfile {
        UserProfile {
            name: name.to_string(),
            avatar_hash: hash.to_string(),
            image_72: format!("https://avatars.example/{hash}_72.jpg"),
        }
    }

    #[test]
    fn first_registration_emits_avatar_fetch() {
        let mut users = UserDirectory::new();
        let mut fetches = Vec::<FetchInstruction>::new();

        let first = users
            .register("U1", &profile("alice", "a1"), &mut fetches)
            .expect("register");
        let second = users
            .register("U1", &profile("alicia", "a2"), &mut fetches)
            .expect("register");
        assert!(first);
        assert!(!second);

        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].dest, "avatars/a1.jpg");
        assert_eq!(fetches[0].source, "https://avatars.example/a1_72.jpg");
        let detail = users.get("U1").expect("known");
        assert_eq!(detail.name, "alice");
        assert_eq!(detail.avatar, "avatars/a1.jpg");
    }

    #[test]
    fn slackbot_seed_is_never_overwritten() {
        let mut users = UserDirectory::new();
        let mut fetches = Vec::<FetchInstruction>::new();
        users
            .register(SLACKBOT_ID, &profile("impostor", "x"), &mut fetches)
            .expect("register");
        assert!(fetches.is_empty());
        assert_eq!(users.get(SLACKBOT_ID).expect("seeded").name, "Slackbot");
    }

    #[test]
    fn unknown_user_lookup_fails_but_placeholder_does_not() {
        let users = UserDirectory::new();
        let err = users.get("U404").expect_err("must fail");
        assert!(format!("{err}").contains("unknown user: U404"));

        let placeholder = users.get_or_placeholder("U404");
        assert_eq!(placeholder.name, "U404");
        assert_eq!(placeholder.avatar, PLACEHOLDER_AVATAR);
    }

    #[test]
    fn populate_only_uses_records_with_profiles() {
        let messages: Vec<Message> = serde_json::from_str(
            r#"[
                {"user":"U1","text":"a","ts":"1"},
                {"user":"U2","text":"b","ts":"2","user_profile":{"name":"bob","avatar_hash":"b1","image_72":"https://x/b.jpg"}},
                {"user":"U2","text":"c","ts":"3","user_profile":{"name":"bob","avatar_hash":"b1","image_72":"https://x/b.jpg"}}
            ]"#,
        )
        .expect("parse");
        let mut users = UserDirectory::new();
        let mut fetches = Vec::<FetchInstruction>::new();
        users.populate(&messages, &mut fetches).expect("populate");

        assert!(!users.contains("U1"));
        assert!(users.contains("U2"));
        assert_eq!(users.len(), 2);
        assert_eq!(fetches.len(), 1);
    }

    #[test]
    fn substitutes_ids_anywhere_in_text() {
        let mut users = UserDirectory::new();
        let mut fetches = Vec::<FetchInstruction>::new();
        users
            .register("U1", &profile("alice", "a1"), &mut fetches)
            .expect("register");
        assert_eq!(
            users.substitute_ids("ping U1 and <@U1>"),
            "ping alice and <@alice>"
        );
        assert_eq!(users.substitute_ids("XU1X"), "XaliceX");
    }
}
