use anyhow::{anyhow, bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    /// Show previous.
    TapLeft,
    /// Show next.
    TapRight,
    /// Dismiss the carousel.
    SwipeDown,
    /// The page surface was moved straight to this item.
    Select(usize),
    Pause,
    Resume,
}

impl UserInput {
    /// Left half of the surface goes back, right half goes forward.
    pub fn from_tap(x: f64, width: f64) -> Self {
        if x < width / 2.0 {
            UserInput::TapLeft
        } else {
            UserInput::TapRight
        }
    }

    /// Parses one command line of the terminal demo.
    ///
    /// `l`/`left`, `r`/`right`, `d`/`down`, `p`/`pause`, `c`/`continue`,
    /// a bare item number, or `tap X WIDTH`.
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            bail!("empty command");
        };

        let input = match command.to_ascii_lowercase().as_str() {
            "l" | "left" => UserInput::TapLeft,
            "r" | "right" => UserInput::TapRight,
            "d" | "down" => UserInput::SwipeDown,
            "p" | "pause" => UserInput::Pause,
            "c" | "continue" => UserInput::Resume,
            "tap" => {
                let x: f64 = parts
                    .next()
                    .ok_or_else(|| anyhow!("tap needs an x coordinate"))?
                    .parse()?;
                let width: f64 = parts
                    .next()
                    .ok_or_else(|| anyhow!("tap needs a surface width"))?
                    .parse()?;
                if width.is_nan() || width <= 0.0 {
                    bail!("surface width must be positive");
                }
                UserInput::from_tap(x, width)
            }
            other => match other.parse::<usize>() {
                Ok(index) => UserInput::Select(index),
                Err(_) => bail!("unknown command: {other}"),
            },
        };
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taps_split_the_surface_in_half() {
        assert_eq!(UserInput::from_tap(10.0, 390.0), UserInput::TapLeft);
        assert_eq!(UserInput::from_tap(194.9, 390.0), UserInput::TapLeft);
        assert_eq!(UserInput::from_tap(195.0, 390.0), UserInput::TapRight);
        assert_eq!(UserInput::from_tap(389.0, 390.0), UserInput::TapRight);
    }

    #[test]
    fn parses_demo_commands() {
        assert_eq!(UserInput::parse("l").unwrap(), UserInput::TapLeft);
        assert_eq!(UserInput::parse(" RIGHT ").unwrap(), UserInput::TapRight);
        assert_eq!(UserInput::parse("down").unwrap(), UserInput::SwipeDown);
        assert_eq!(UserInput::parse("2").unwrap(), UserInput::Select(2));
        assert_eq!(UserInput::parse("tap 300 390").unwrap(), UserInput::TapRight);
        assert_eq!(UserInput::parse("p").unwrap(), UserInput::Pause);
        assert_eq!(UserInput::parse("c").unwrap(), UserInput::Resume);

        assert!(UserInput::parse("").is_err());
        assert!(UserInput::parse("-1").is_err());
        assert!(UserInput::parse("tap 10").is_err());
        assert!(UserInput::parse("tap 10 0").is_err());
        assert!(UserInput::parse("jump").is_err());
    }
}
