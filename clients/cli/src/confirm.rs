use anyhow::{Context, Result};

static ACCEPTABLE_YES: &[&str] = &["y", "yes", "Y", "YES"];

pub fn confirm_fn<T>(always_yes: bool, msg: T) -> Result<bool>
where
    T: AsRef<str>,
{
    if always_yes {
        return Ok(true);
    }
    let answer = rprompt::prompt_reply(format!("{} [y/N] ", msg.as_ref()))
        .context("Failed to read confirmation")?;
    Ok(ACCEPTABLE_YES.contains(&answer.trim()))
}

#[rustfmt::skip]
macro_rules! confirm {
    ($opts:ident, $($arg:tt)*) => {{
        let res = ::std::format!($($arg)*);
        $crate::confirm::confirm_fn($opts.yes, res)?
    }}
}

#[rustfmt::skip]
macro_rules! confirm_or_abort {
    ($opts:ident, $($arg:tt)*) => {{
        let res = ::std::format!($($arg)*);
        if !$crate::confirm::confirm_fn($opts.yes, res)? {
            return Err(::anyhow::anyhow!("Aborted!"));
        }
    }}
}

pub(crate) use {confirm, confirm_or_abort};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_yes_skips_prompt() {
        assert!(confirm_fn(true, "Remove everything?").unwrap());
    }
}
