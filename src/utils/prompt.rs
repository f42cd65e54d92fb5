// Interactive console prompts
use std::io::{stdin, stdout, BufRead, Write};

use crate::errors::{BackupError, Result};

#[cfg_attr(test, mockall::automock)]
pub trait Prompt {
    /// Asks a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&self, message: &str) -> Result<bool>;

    /// Asks the operator to pick one of `options` and returns the chosen entry.
    fn choose(&self, message: &str, options: &[String]) -> Result<String>;
}

pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn confirm(&self, message: &str) -> Result<bool> {
        confirm_from(&mut stdin().lock(), message)
    }

    fn choose(&self, message: &str, options: &[String]) -> Result<String> {
        choose_from(&mut stdin().lock(), message, options)
    }
}

/// Reads one trimmed answer. A closed input stream means nobody can answer.
fn read_answer(input: &mut impl BufRead) -> Result<String> {
    stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        println!();
        return Err(BackupError::Aborted);
    }
    Ok(line.trim().to_string())
}

fn confirm_from(input: &mut impl BufRead, message: &str) -> Result<bool> {
    print!("{} [y|N]: ", message);
    let answer = read_answer(input)?;
    Ok(parse_confirmation(&answer))
}

fn choose_from(input: &mut impl BufRead, message: &str, options: &[String]) -> Result<String> {
    if options.is_empty() {
        return Err(BackupError::Aborted);
    }
    loop {
        println!("{}", message);
        for (index, option) in options.iter().enumerate() {
            println!("  [{}] {}", index, option);
        }
        print!("Enter your choice: ");
        let answer = read_answer(input)?;
        match parse_choice(&answer, options) {
            Some(choice) => return Ok(choice),
            None => println!("❌ Invalid choice '{}'. Please try again.", answer),
        }
    }
}

/// Confirmation gate in front of destructive operations.
pub fn confirm_or_abort(prompt: &dyn Prompt, assume_yes: bool, message: &str) -> Result<()> {
    if assume_yes || prompt.confirm(message)? {
        Ok(())
    } else {
        Err(BackupError::Aborted)
    }
}

fn parse_confirmation(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Accepts either the option's index or its exact text.
fn parse_choice(input: &str, options: &[String]) -> Option<String> {
    let input = input.trim();
    if let Ok(index) = input.parse::<usize>() {
        return options.get(index).cloned();
    }
    options.iter().find(|option| option.as_str() == input).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_confirmation() {
        assert!(parse_confirmation("y"));
        assert!(parse_confirmation(" YES "));
        assert!(!parse_confirmation(""));
        assert!(!parse_confirmation("n"));
        assert!(!parse_confirmation("sure"));
    }

    #[test]
    fn test_confirm_or_abort() {
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().times(1).returning(|_| Ok(false));
        assert!(matches!(confirm_or_abort(&prompt, false, "Sure?"), Err(BackupError::Aborted)));

        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().never();
        assert!(confirm_or_abort(&prompt, true, "Sure?").is_ok());
    }

    #[test]
    fn test_parse_choice_by_index_or_name() {
        let options = vec!["shop_2.sql.gz".to_string(), "shop_1.sql".to_string()];
        assert_eq!(parse_choice("1", &options), Some("shop_1.sql".to_string()));
        assert_eq!(parse_choice("shop_2.sql.gz", &options), Some("shop_2.sql.gz".to_string()));
        assert_eq!(parse_choice("7", &options), None);
        assert_eq!(parse_choice("other.sql", &options), None);
    }

    #[test]
    fn test_choose_retries_until_valid_answer() -> anyhow::Result<()> {
        let options = vec!["shop_2.sql.gz".to_string(), "shop_1.sql".to_string()];
        let mut input = Cursor::new("9\n\nshop_1.sql\n");
        assert_eq!(choose_from(&mut input, "Which?", &options)?, "shop_1.sql");
        Ok(())
    }

    #[test]
    fn test_closed_input_aborts() {
        let options = vec!["a.sql".to_string()];
        assert!(matches!(
            choose_from(&mut Cursor::new(""), "Which?", &options),
            Err(BackupError::Aborted)
        ));
        // Invalid answers followed by end of input must not spin.
        assert!(matches!(
            choose_from(&mut Cursor::new("nope\n"), "Which?", &options),
            Err(BackupError::Aborted)
        ));
        assert!(matches!(confirm_from(&mut Cursor::new(""), "Sure?"), Err(BackupError::Aborted)));
    }

    #[test]
    fn test_confirm_reads_answer() -> anyhow::Result<()> {
        assert!(confirm_from(&mut Cursor::new("yes\n"), "Sure?")?);
        assert!(!confirm_from(&mut Cursor::new("\n"), "Sure?")?);
        Ok(())
    }
}
