use regex::Regex;

/// Behaviour profile for a roster manager.
///
/// All options default; callers override individual settings with the
/// builder methods. The defaults match the conventional profile:
/// per-entry identifiers on, index declarations on, unique sparse
/// addresses, no minimum entry count, `emvc-` code prefix, codes that
/// never expire, and identity field naming.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether entries carry their own identifier.
    entry_ids: bool,

    /// Whether to declare lookup indexes (by address and by verification
    /// code) in the schema spec.
    indexing: bool,

    /// Whether the external store should enforce address uniqueness across
    /// records.
    unique_addresses: bool,

    /// Whether the uniqueness constraint is sparse (only applied to
    /// documents that carry the field).
    sparse_uniqueness: bool,

    /// Whether persistence requires a non-empty roster.
    require_at_least_one: bool,

    /// Prefix prepended to every generated verification code.
    verification_code_prefix: String,

    /// Default code lifetime in hours. Zero means codes never expire.
    verification_code_expiration_hours: i64,

    /// Address format predicate applied at validation time.
    address_format: Regex,

    /// Naming transform applied to the external field names.
    field_naming: FieldNaming,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry_ids: true,
            indexing: true,
            unique_addresses: true,
            sparse_uniqueness: true,
            require_at_least_one: false,
            verification_code_prefix: "emvc-".to_owned(),
            verification_code_expiration_hours: 0,
            address_format: default_address_format(),
            field_naming: FieldNaming::Identity,
        }
    }
}

impl Config {
    /// Sets whether entries carry a per-entry identifier.
    #[must_use]
    pub const fn with_entry_ids(mut self, value: bool) -> Self {
        self.entry_ids = value;
        self
    }

    /// Sets whether the schema spec declares lookup indexes.
    #[must_use]
    pub const fn with_indexing(mut self, value: bool) -> Self {
        self.indexing = value;
        self
    }

    /// Sets whether the external store should enforce address uniqueness.
    #[must_use]
    pub const fn with_unique_addresses(mut self, value: bool) -> Self {
        self.unique_addresses = value;
        self
    }

    /// Sets whether the uniqueness constraint is sparse.
    #[must_use]
    pub const fn with_sparse_uniqueness(mut self, value: bool) -> Self {
        self.sparse_uniqueness = value;
        self
    }

    /// Sets whether persistence requires at least one entry.
    #[must_use]
    pub const fn with_require_at_least_one(mut self, value: bool) -> Self {
        self.require_at_least_one = value;
        self
    }

    /// Sets the prefix prepended to generated verification codes.
    #[must_use]
    pub fn with_verification_code_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.verification_code_prefix = prefix.into();
        self
    }

    /// Sets the default verification code lifetime in hours.
    ///
    /// Zero means generated codes never expire.
    #[must_use]
    pub const fn with_verification_code_expiration_hours(mut self, hours: i64) -> Self {
        self.verification_code_expiration_hours = hours;
        self
    }

    /// Sets the address format predicate.
    #[must_use]
    pub fn with_address_format(mut self, format: Regex) -> Self {
        self.address_format = format;
        self
    }

    /// Sets the field-naming transform for the external representation.
    #[must_use]
    pub const fn with_field_naming(mut self, naming: FieldNaming) -> Self {
        self.field_naming = naming;
        self
    }

    /// Whether entries carry a per-entry identifier.
    #[must_use]
    pub const fn entry_ids(&self) -> bool {
        self.entry_ids
    }

    /// Whether the schema spec declares lookup indexes.
    #[must_use]
    pub const fn indexing(&self) -> bool {
        self.indexing
    }

    /// Whether the external store should enforce address uniqueness.
    #[must_use]
    pub const fn unique_addresses(&self) -> bool {
        self.unique_addresses
    }

    /// Whether the uniqueness constraint is sparse.
    #[must_use]
    pub const fn sparse_uniqueness(&self) -> bool {
        self.sparse_uniqueness
    }

    /// Whether persistence requires at least one entry.
    #[must_use]
    pub const fn require_at_least_one(&self) -> bool {
        self.require_at_least_one
    }

    /// The prefix prepended to generated verification codes.
    #[must_use]
    pub fn verification_code_prefix(&self) -> &str {
        &self.verification_code_prefix
    }

    /// The default verification code lifetime in hours.
    #[must_use]
    pub const fn verification_code_expiration_hours(&self) -> i64 {
        self.verification_code_expiration_hours
    }

    /// The address format predicate.
    #[must_use]
    pub const fn address_format(&self) -> &Regex {
        &self.address_format
    }

    /// Checks an address against the configured format predicate.
    #[must_use]
    pub fn address_is_valid(&self, address: &str) -> bool {
        self.address_format.is_match(address)
    }

    /// Resolves the external field names under the configured naming
    /// transform.
    #[must_use]
    pub fn field_names(&self) -> FieldNames {
        FieldNames::resolve(&self.field_naming)
    }
}

fn default_address_format() -> Regex {
    // Deliberately permissive: anything with an `@` and non-empty segments
    // either side. Stricter formats are the caller's business.
    Regex::new("^.+@.+$").expect("default address format is valid")
}

/// Transform applied to the canonical field names to produce the external
/// representation.
///
/// This only affects how documents and index paths are spelled; it never
/// changes semantics.
#[derive(Debug, Clone, Copy)]
pub enum FieldNaming {
    /// Keep the canonical `snake_case` names unchanged.
    Identity,
    /// Apply a caller-supplied transform to each canonical name.
    Custom(fn(&str) -> String),
}

impl FieldNaming {
    fn apply(self, key: &str) -> String {
        match self {
            Self::Identity => key.to_owned(),
            Self::Custom(transform) => transform(key),
        }
    }
}

/// The resolved external field names for a roster's document representation.
///
/// Produced by applying the configured [`FieldNaming`] uniformly to the
/// canonical keys. The dotted index paths are composed from these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    collection: String,
    address: String,
    primary: String,
    verification: String,
    date: String,
    code: String,
    code_expiration: String,
}

impl FieldNames {
    fn resolve(naming: &FieldNaming) -> Self {
        Self {
            collection: naming.apply("email_addresses"),
            address: naming.apply("email_address"),
            primary: naming.apply("primary"),
            verification: naming.apply("verification"),
            date: naming.apply("date"),
            code: naming.apply("code"),
            code_expiration: naming.apply("code_expiration"),
        }
    }

    /// The name of the embedded collection field.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The name of the per-entry address field.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The name of the primary marker field.
    #[must_use]
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// The name of the verification block field.
    #[must_use]
    pub fn verification(&self) -> &str {
        &self.verification
    }

    /// The name of the confirmation timestamp field.
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// The name of the verification code field.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The name of the code expiration field.
    #[must_use]
    pub fn code_expiration(&self) -> &str {
        &self.code_expiration
    }

    /// The dotted path used to index and query entries by address.
    #[must_use]
    pub fn address_path(&self) -> String {
        format!("{}.{}", self.collection, self.address)
    }

    /// The dotted path used to index and query entries by verification code.
    #[must_use]
    pub fn code_path(&self) -> String {
        format!("{}.{}.{}", self.collection, self.verification, self.code)
    }
}
