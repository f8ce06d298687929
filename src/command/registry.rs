//! Ordered command table with a fallback entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::context::InvocationContext;
use super::dispatcher::Dispatcher;
use super::validator::ArgValidator;
use super::DEFAULT_COMMAND;
use crate::BoxFuture;

/// Handler entry point. Receives the invocation and the dispatcher that
/// owns the registry and collaborators.
pub type Handler = for<'a> fn(&'a InvocationContext, &'a Dispatcher) -> BoxFuture<'a, ()>;

/// One registered command. Immutable once built.
#[derive(Clone)]
pub struct CommandDescriptor {
    name: String,
    handler: Handler,
    usage: String,
    help: String,
    validator: Option<Arc<dyn ArgValidator>>,
    visible: bool,
}

impl CommandDescriptor {
    /// Start a descriptor for `name`; names are matched case-insensitively.
    #[must_use]
    pub fn new(name: &str, handler: Handler) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            handler,
            usage: String::new(),
            help: String::new(),
            validator: None,
            visible: true,
        }
    }

    /// Usage line shown in help, e.g. `ping <channel_name>`.
    #[must_use]
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// One-line description shown in help.
    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Argument validator run before the handler.
    #[must_use]
    pub fn validator(mut self, validator: impl ArgValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Exclude from help output.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler function.
    #[must_use]
    pub fn handler(&self) -> Handler {
        self.handler
    }

    /// Usage line.
    #[must_use]
    pub fn usage_text(&self) -> &str {
        &self.usage
    }

    /// Help text.
    #[must_use]
    pub fn help_text(&self) -> &str {
        &self.help
    }

    /// Whether the descriptor appears in help.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Run the validator, if any.
    #[must_use]
    pub fn validate(&self, args: &[String]) -> Option<String> {
        self.validator.as_ref().and_then(|v| v.validate(args))
    }

    fn help_line(&self) -> String {
        format!(" - `{}`: {}", self.usage, self.help)
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("help", &self.help)
            .field("has_validator", &self.validator.is_some())
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

/// Help preamble.
pub const HELP_HEADER: &str = "Hi, I'm oncall bot, I can help you to manage oncall schedule. \
                               Here are all the available commands:\n";

/// Name-to-descriptor table that preserves registration order.
///
/// The fallback descriptor is supplied at construction, so lookups
/// always have something to return.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: Vec<CommandDescriptor>,
    index: HashMap<String, usize>,
    fallback: CommandDescriptor,
}

impl CommandRegistry {
    /// Create a registry whose unmatched lookups return `fallback`.
    #[must_use]
    pub fn new(fallback: CommandDescriptor) -> Self {
        Self {
            commands: Vec::new(),
            index: HashMap::new(),
            fallback,
        }
    }

    /// Register `descriptor`, replacing any earlier one with the same
    /// name. A replaced command keeps its original help position.
    /// Registering [`DEFAULT_COMMAND`] replaces the fallback.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> &mut Self {
        if descriptor.name.eq_ignore_ascii_case(DEFAULT_COMMAND) {
            self.fallback = descriptor;
        } else if let Some(&slot) = self.index.get(&descriptor.name) {
            self.commands[slot] = descriptor;
        } else {
            self.index
                .insert(descriptor.name.clone(), self.commands.len());
            self.commands.push(descriptor);
        }
        self
    }

    /// Descriptor for `name`, or the fallback when nothing matches.
    #[must_use]
    pub fn lookup(&self, name: &str) -> &CommandDescriptor {
        let key = name.trim().to_lowercase();
        self.index
            .get(&key)
            .and_then(|&slot| self.commands.get(slot))
            .unwrap_or(&self.fallback)
    }

    /// Whether `name` is registered (the fallback does not count).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.trim().to_lowercase())
    }

    /// Registered descriptors in order, without the fallback.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter()
    }

    /// Help text listing every visible command, fallback last.
    #[must_use]
    pub fn render_help(&self) -> String {
        let lines: Vec<String> = self
            .commands
            .iter()
            .chain(std::iter::once(&self.fallback))
            .filter(|d| d.visible)
            .map(CommandDescriptor::help_line)
            .collect();
        format!("{HELP_HEADER}{}", lines.join("\n"))
    }
}
