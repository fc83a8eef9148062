//! Directive file loading.
//!
//! # Data Flow
//! ```text
//! directive file
//!     → lexer.rs (line-numbered tokens)
//!     → group_directives (tokens per directive name, occurrences merged)
//!     → Controller (dispenser + root + startup hooks)
//!     → directive setup function (e.g. errors::setup_errors)
//!     → Site (middleware layers + startup hooks)
//! ```

use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::config::dispenser::{Dispenser, ParseError};
use crate::config::lexer::{tokenize, Token};
use crate::config::loader::{read_file, ConfigError};
use crate::config::schema::SiteConfig;
use crate::errors::{setup_errors, ErrorsLayer};
use crate::lifecycle::StartupHooks;

/// State handed to a directive's setup function.
///
/// Dereferences to the [`Dispenser`] over the directive's tokens.
pub struct Controller<'a> {
    dispenser: Dispenser,
    root: &'a Path,
    startup: &'a mut StartupHooks,
}

impl<'a> Controller<'a> {
    pub fn new(dispenser: Dispenser, root: &'a Path, startup: &'a mut StartupHooks) -> Self {
        Self {
            dispenser,
            root,
            startup,
        }
    }

    /// Document root that relative paths resolve against.
    pub fn root(&self) -> &Path {
        self.root
    }

    /// Hooks that run once before the server accepts traffic.
    pub fn startup(&mut self) -> &mut StartupHooks {
        self.startup
    }
}

impl Deref for Controller<'_> {
    type Target = Dispenser;

    fn deref(&self) -> &Dispenser {
        &self.dispenser
    }
}

impl DerefMut for Controller<'_> {
    fn deref_mut(&mut self) -> &mut Dispenser {
        &mut self.dispenser
    }
}

/// Everything the directive file contributes to the server.
#[derive(Debug, Default)]
pub struct Site {
    pub errors: Option<ErrorsLayer>,
    pub startup: StartupHooks,
}

/// Load the site's directive file, if one is configured.
pub fn load_site(config: &SiteConfig) -> Result<Site, ConfigError> {
    let Some(path) = &config.directives else {
        return Ok(Site::default());
    };
    let input = read_file(path)?;
    let site = parse_site(&path.display().to_string(), &input, &config.root)?;
    tracing::info!(
        file = %path.display(),
        errors = site.errors.is_some(),
        startup_hooks = site.startup.len(),
        "Directives loaded"
    );
    Ok(site)
}

/// Parse directive text.
pub fn parse_site(file: &str, input: &str, root: &Path) -> Result<Site, ParseError> {
    let tokens = tokenize(file, input)?;
    let mut site = Site::default();

    for (name, tokens) in group_directives(file, tokens)? {
        let dispenser = Dispenser::new(file, tokens);
        let mut c = Controller::new(dispenser, root, &mut site.startup);
        match name.as_str() {
            "errors" => site.errors = Some(setup_errors(&mut c)?),
            other => {
                c.next();
                return Err(c.err(format!("Unknown directive '{}'", other)));
            }
        }
    }

    Ok(site)
}

/// Split tokens into directives. A directive starts on a new line at
/// nesting depth zero and runs until the next such token. Tokens of
/// repeated directives are concatenated in order of first appearance.
fn group_directives(file: &str, tokens: Vec<Token>) -> Result<Vec<(String, Vec<Token>)>, ParseError> {
    let mut groups: Vec<(String, Vec<Token>)> = Vec::new();
    let mut tokens = tokens.into_iter().peekable();

    while let Some(head) = tokens.next() {
        if head.text == "{" || head.text == "}" {
            return Err(ParseError::new(
                file,
                head.line,
                format!("Unexpected '{}', expecting a directive", head.text),
            ));
        }

        let name = head.text.clone();
        let mut last_line = head.line;
        let mut depth = 0usize;
        let mut body = vec![head];

        while let Some(token) = tokens.next_if(|t| depth > 0 || t.line == last_line) {
            match token.text.as_str() {
                "{" => depth += 1,
                "}" if depth == 0 => {
                    return Err(ParseError::new(file, token.line, "Unexpected '}'"));
                }
                "}" => depth -= 1,
                _ => {}
            }
            last_line = token.line;
            body.push(token);
        }

        if depth > 0 {
            return Err(ParseError::new(
                file,
                last_line,
                "Unexpected end of file, missing '}'",
            ));
        }

        match groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => existing.extend(body),
            None => groups.push((name, body)),
        }
    }

    Ok(groups)
}
