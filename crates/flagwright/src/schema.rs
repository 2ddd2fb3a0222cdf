//! Declaring a grammar from a description of bound fields.
//!
//! A [`Schema`] lists fields, each bound to a [`Bound`] handle, and nested
//! schemas that become commands. [`Schema::register`] turns the whole
//! description into command and flag registrations; the parser writes values
//! back into the handles as it resolves them.
//!
//! ```
//! use flagwright::{Bound, Field, Parser, Schema};
//!
//! let verbose = Bound::new(false);
//! let name = Bound::new(String::new());
//! let admin = Bound::new(false);
//!
//! let schema = Schema::new()
//!     .field(Field::new("verbose", &verbose).short('v'))
//!     .command(
//!         "user",
//!         "Manage users",
//!         Schema::new().command(
//!             "create",
//!             "Create a user",
//!             Schema::new()
//!                 .field(Field::new("name", &name).required())
//!                 .field(Field::new("admin", &admin)),
//!         ),
//!     );
//!
//! let mut parser = Parser::new();
//! schema.register(&mut parser).unwrap();
//!
//! assert!(parser.parse(["-v", "user", "create", "--name", "ada", "--admin"]));
//! assert!(verbose.get());
//! assert_eq!(name.get(), "ada");
//! assert!(admin.get());
//! ```

use crate::bind::{Bindable, Bound};
use crate::command::{Command, PATH_SEPARATOR};
use crate::error::ConfigError;
use crate::flag::{Flag, FlagKind};
use crate::parser::Parser;

/// One bound field.
#[derive(Debug, Clone)]
pub struct Field(Flag);

impl Field {
    pub fn new<T: Bindable>(name: impl Into<String>, target: &Bound<T>) -> Self {
        Self(Flag::new(name).bind(target))
    }

    pub fn short(self, short: impl Into<String>) -> Self {
        Self(self.0.short(short))
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        Self(self.0.description(description))
    }

    pub fn required(self) -> Self {
        Self(self.0.required())
    }

    pub fn default(self, value: impl Into<String>) -> Self {
        Self(self.0.default(value))
    }

    /// Override the kind the bound type implies.
    pub fn kind(self, kind: FlagKind) -> Self {
        Self(self.0.with_kind(kind))
    }

    pub fn capacity(self, capacity: i64) -> Self {
        Self(self.0.capacity(capacity))
    }

    pub fn secure(self, prompt: impl Into<String>) -> Self {
        Self(self.0.secure(prompt))
    }

    pub fn accept(self, pattern: impl Into<String>, description: impl Into<String>) -> Self {
        Self(self.0.accept(pattern, description))
    }

    pub fn env(self, var: impl Into<String>) -> Self {
        Self(self.0.env(var))
    }

    /// The flag this field registers.
    pub fn into_flag(self) -> Flag {
        self.0
    }
}

/// A nested group of fields and commands.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
    commands: Vec<(String, String, Schema)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// A nested command, with its own fields and sub-commands.
    pub fn command(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Schema,
    ) -> Self {
        self.commands
            .push((name.into(), description.into(), schema));
        self
    }

    /// Register every command and field with `parser`.
    pub fn register(self, parser: &mut Parser) -> Result<(), ConfigError> {
        for (name, description, schema) in &self.commands {
            parser.command(schema.to_command(name, description))?;
        }
        self.register_fields(parser, "")
    }

    fn to_command(&self, name: &str, description: &str) -> Command {
        self.commands.iter().fold(
            Command::new(name).description(description),
            |cmd, (sub, desc, schema)| cmd.subcommand(schema.to_command(sub, desc)),
        )
    }

    fn register_fields(self, parser: &mut Parser, path: &str) -> Result<(), ConfigError> {
        for field in self.fields {
            parser.register_scoped(path, field.into_flag())?;
        }
        for (name, _, schema) in self.commands {
            let nested = if path.is_empty() {
                name
            } else {
                format!("{}{}{}", path, PATH_SEPARATOR, name)
            };
            schema.register_fields(parser, &nested)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlagKey;

    #[test]
    fn nested_schema_registers_scoped_flags() {
        let force = Bound::new(false);
        let schema = Schema::new().command(
            "user",
            "",
            Schema::new().command(
                "delete",
                "",
                Schema::new().field(Field::new("force", &force)),
            ),
        );

        let mut parser = Parser::new();
        schema.register(&mut parser).unwrap();

        assert!(parser.tree().contains("user delete"));
        assert!(parser
            .registry()
            .contains(&FlagKey::scoped("user delete", "force")));
    }

    #[test]
    fn kind_comes_from_bound_type() {
        let tags = Bound::new(Vec::<String>::new());
        let schema = Schema::new().field(Field::new("tags", &tags));
        let mut parser = Parser::new();
        schema.register(&mut parser).unwrap();
        assert_eq!(
            parser.lookup("tags", "").unwrap().kind(),
            FlagKind::Chained
        );
    }
}
