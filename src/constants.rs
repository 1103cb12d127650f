//! Centralized constants for directory attributes, defaults, and limits.

/// Name of the config file searched in the standard locations.
pub const CONFIG_FILENAME: &str = "credops.yaml";

/// Default filename for an external password-profile catalog.
pub const PROFILES_FILENAME: &str = "password_profiles.yaml";

/// Per-user config directory under `$HOME`.
pub const USER_CONFIG_DIR: &str = ".credops";

/// System-wide config directory.
pub const SYSTEM_CONFIG_DIR: &str = "/etc/credops";

/// Name of the profile set used when none is requested.
pub const DEFAULT_PROFILE_SET: &str = "default";

/// Special characters allowed in generated passwords unless a profile set
/// or `--special-chars` overrides them.
pub const DEFAULT_SPECIAL_CHARS: &str = "!$%&/()=?-_+<>|#@;:,.[]{}*";

/// Ad-hoc profile used by `ldap set-password --generate` when none is given.
pub const LDAP_PASSWORD_PROFILE: &str = "8 1 1 1 0 0";

/// LDAP attribute holding SSH public keys.
pub const LDAP_SSH_ATTR: &str = "sshPublicKey";

/// Object class an entry must carry before `sshPublicKey` may be written.
pub const LDAP_PUBLIC_KEY_OBJECT_CLASS: &str = "ldapPublicKey";

/// Default LDAP connection timeout in seconds.
pub const DEFAULT_LDAP_TIMEOUT: u64 = 20;

/// Default SSH public key file for `ldap set-ssh-key`.
pub const DEFAULT_SSH_KEY_FILE: &str = "id_rsa.pub";

/// Default KV2 mount of the secret store.
pub const DEFAULT_KV_MOUNT: &str = "secret";

/// Minimum byte length of a secret-store write payload.
pub const MIN_WRITE_PAYLOAD: usize = 3;

/// Attempts the password generator makes before giving up on a profile.
pub const PWGEN_MAX_TRIES: usize = 1000;

/// Compiled-in password profile catalog.
pub const BUILTIN_PROFILE_SETS: &str = r#"
default:
  profile:
    length: 16
    upper: 1
    lower: 1
    digits: 1
    specials: 1
    first_is_char: true
  special_chars: "!$%&/()=?-_+<>|#@;:,.[]{}*"
easy:
  profile:
    length: 8
    upper: 1
    lower: 1
    digits: 1
    specials: 0
strong:
  profile:
    length: 48
    upper: 2
    lower: 2
    digits: 2
    specials: 2
    first_is_char: false
  special_chars: "!$%&/()=?-_+<>|#@;:,.[]{}*"
"#;
