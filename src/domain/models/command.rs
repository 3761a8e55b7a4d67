#[cfg(test)]
#[path = "command_test.rs"]
mod tests;

const UPLOAD_PREFIX: &str = "upload ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Upload(String),
    Chat(String),
    Noop,
}

impl Command {
    /// Classifies a raw input line. Pure, nothing is dispatched here.
    pub fn parse(text: &str) -> Command {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Command::Noop;
        }

        if trimmed.eq_ignore_ascii_case("quit") {
            return Command::Quit;
        }

        let leading = text.trim_start();
        if let Some(prefix) = leading.get(..UPLOAD_PREFIX.len()) {
            if prefix.eq_ignore_ascii_case(UPLOAD_PREFIX) {
                let path = leading[UPLOAD_PREFIX.len()..].trim();
                if path.is_empty() {
                    return Command::Noop;
                }
                return Command::Upload(path.to_string());
            }
        }

        return Command::Chat(text.to_string());
    }
}
