use std::io::{self, BufRead, Write};

use colored::Colorize;

/// Ask before deleting `orphans` on the terminal.
pub fn confirm_deletion(orphans: &[String]) -> bool {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    confirm_deletion_with(orphans, &mut stdin.lock(), &mut stdout).unwrap_or(false)
}

/// `[y/N]` prompt: only `y`/`yes` accept, empty input or end of input
/// declines, anything else asks again.
pub fn confirm_deletion_with<R, W>(orphans: &[String], input: &mut R, output: &mut W) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    let warning = format!("You're about to delete: {}", orphans.join(", "));
    writeln!(output, "{}", warning.red())?;

    loop {
        write!(output, "Do you want to continue? [y/N]: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "" | "n" | "no" => return Ok(false),
            _ => writeln!(output, "Error: invalid input")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(answers: &str) -> (bool, String) {
        colored::control::set_override(false);
        let orphans = vec!["a".to_string(), "b".to_string()];
        let mut output = Vec::new();
        let answer =
            confirm_deletion_with(&orphans, &mut answers.as_bytes(), &mut output).unwrap();
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn yes_confirms() {
        let (answer, output) = ask("y\n");
        assert!(answer);
        assert_eq!(
            output,
            "You're about to delete: a, b\nDo you want to continue? [y/N]: "
        );
        assert!(ask("YES\n").0);
    }

    #[test]
    fn default_is_no() {
        assert!(!ask("\n").0);
        assert!(!ask("n\n").0);
        assert!(!ask("").0);
    }

    #[test]
    fn invalid_input_asks_again() {
        let (answer, output) = ask("maybe\ny\n");
        assert!(answer);
        assert!(output.contains("Error: invalid input\nDo you want to continue? [y/N]: "));
    }
}
