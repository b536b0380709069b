use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result, bail};

/// Asks for one of `options` on the controlling terminal. Fails when stdin is
/// not a terminal, so scripted runs never block on a menu.
pub fn select(label: &str, options: &[String]) -> Result<String> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        bail!("no {label} given and stdin is not a terminal; pass it as a flag");
    }

    let mut reader = stdin.lock();
    let mut writer = io::stdout().lock();
    choose(&mut reader, &mut writer, label, options)
}

/// Numbered menu. Accepts either the 1-based index or the exact option text
/// and asks again on anything else.
pub fn choose<R, W>(reader: &mut R, writer: &mut W, label: &str, options: &[String]) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    if options.is_empty() {
        bail!("no {label} available to choose from");
    }

    for (index, option) in options.iter().enumerate() {
        writeln!(writer, "  {}) {option}", index + 1)?;
    }

    loop {
        write!(writer, "Select {label} [1-{}]: ", options.len())?;
        writer.flush()?;

        let mut input = String::new();
        let read = reader
            .read_line(&mut input)
            .with_context(|| format!("failed to read {label} selection"))?;
        if read == 0 {
            bail!("no {label} selected");
        }

        let answer = input.trim();
        if let Ok(number) = answer.parse::<usize>() {
            if (1..=options.len()).contains(&number) {
                return Ok(options[number - 1].clone());
            }
        }
        if let Some(option) = options.iter().find(|option| option.as_str() == answer) {
            return Ok(option.clone());
        }

        writeln!(writer, "'{answer}' is not one of the listed {label} options")?;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn options() -> Vec<String> {
        vec!["en".to_string(), "de".to_string(), "grc".to_string()]
    }

    #[test]
    fn accepts_index_or_name() {
        let mut output = Vec::new();
        let chosen = choose(&mut Cursor::new("2\n"), &mut output, "category", &options())
            .expect("index");
        assert_eq!(chosen, "de");

        let chosen = choose(&mut Cursor::new("grc\n"), &mut Vec::new(), "category", &options())
            .expect("name");
        assert_eq!(chosen, "grc");

        let menu = String::from_utf8(output).expect("utf8");
        assert!(menu.starts_with("  1) en\n  2) de\n  3) grc\n"));
    }

    #[test]
    fn reprompts_until_valid() {
        let mut output = Vec::new();
        let chosen = choose(&mut Cursor::new("0\nfr\n1\n"), &mut output, "category", &options())
            .expect("third answer");
        assert_eq!(chosen, "en");

        let transcript = String::from_utf8(output).expect("utf8");
        assert_eq!(transcript.matches("Select category [1-3]: ").count(), 3);
        assert!(transcript.contains("'fr' is not one of the listed category options"));
    }

    #[test]
    fn end_of_input_and_empty_menus_fail() {
        assert!(choose(&mut Cursor::new(""), &mut Vec::new(), "translation", &options()).is_err());
        assert!(choose(&mut Cursor::new("1\n"), &mut Vec::new(), "translation", &[]).is_err());
    }
}
