//! Console front panel for the emulator.
//!
//! Each stdin line is one action: a run of keypad keys, or a command for
//! the fingerprint sensor. The display is echoed to stdout whenever its
//! content changes.

use anyhow::{Context, Result, bail};
use doorlock_hardware::mock::ScanEvent;
use doorlock_hardware::{Key, SensorFault};

use crate::board::HostHandles;

pub const HELP: &str = "\
keys        type keypad keys, e.g. `2 1111 #` (0-9 A-D * #)
finger N    present the finger stored in template slot N
smudge      present a finger the sensor cannot image
hold        keep a finger resting on the sensor
lift        take the finger off the sensor
show        print the display
help        this text
quit        stop the emulator";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Keys(Vec<Key>),
    Finger(u16),
    Smudge,
    Hold,
    Lift,
    Show,
    Help,
    Quit,
}

/// Parse a console line. Blank lines yield `None`.
///
/// # Errors
///
/// Returns an error for a malformed `finger` command or a character that
/// is not on the keypad.
pub fn parse_line(line: &str) -> Result<Option<Input>> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(None);
    };

    let input = match first.to_ascii_lowercase().as_str() {
        "finger" | "f" => {
            let id = words.next().context("usage: finger <slot>")?;
            let id = id
                .parse::<u16>()
                .with_context(|| format!("not a template slot: {id}"))?;
            Input::Finger(id)
        }
        "smudge" => Input::Smudge,
        "hold" => Input::Hold,
        "lift" => Input::Lift,
        "show" => Input::Show,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        _ => {
            let mut keys = Vec::new();
            for c in line.chars().filter(|c| !c.is_whitespace()) {
                match Key::from_char(c.to_ascii_uppercase()) {
                    Ok(key) => keys.push(key),
                    Err(_) => bail!("'{c}' is not a keypad key (try `help`)"),
                }
            }
            Input::Keys(keys)
        }
    };

    if matches!(input, Input::Keys(_)) || words.next().is_none() {
        Ok(Some(input))
    } else {
        bail!("unexpected text after `{first}`")
    }
}

/// Forward an input to the emulated devices.
///
/// `Show`, `Help` and `Quit` are handled by the caller.
///
/// # Errors
///
/// Returns an error once the controller has dropped its devices.
pub async fn apply(handles: &HostHandles, input: &Input) -> Result<()> {
    match input {
        Input::Keys(keys) => {
            for key in keys {
                handles.keypad.send_key(*key).await?;
            }
        }
        Input::Finger(id) => handles.sensor.queue_scan(ScanEvent::Finger(*id)).await?,
        Input::Smudge => {
            handles
                .sensor
                .queue_scan(ScanEvent::Unreadable(SensorFault::ImageTooMessy))
                .await?;
        }
        Input::Hold => handles.sensor.set_finger_present(true),
        Input::Lift => handles.sensor.set_finger_present(false),
        Input::Show | Input::Help | Input::Quit => {}
    }
    Ok(())
}

/// Draw display rows inside a box.
///
/// # Examples
///
/// ```text
/// +----------------+
/// |1:Finger 2:Code |
/// |A:Admin  B:Time |
/// +----------------+
/// ```
pub fn frame(rows: &[String], backlight: bool) -> String {
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let edge = format!("+{}+", "-".repeat(width));
    let mut out = edge.clone();
    for row in rows {
        out.push_str(&format!("\n|{row:<width$}|"));
    }
    out.push('\n');
    out.push_str(&edge);
    if !backlight {
        out.push_str(" (backlight off)");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("finger 3", Input::Finger(3))]
    #[case("F 12", Input::Finger(12))]
    #[case("smudge", Input::Smudge)]
    #[case("  lift ", Input::Lift)]
    #[case("hold", Input::Hold)]
    #[case("quit", Input::Quit)]
    #[case("?", Input::Help)]
    fn test_commands(#[case] line: &str, #[case] expected: Input) {
        assert_eq!(parse_line(line).unwrap(), Some(expected));
    }

    #[test]
    fn test_keys_ignore_spaces() {
        let input = parse_line("2 11 #").unwrap();
        assert_eq!(
            input,
            Some(Input::Keys(vec![
                Key::Digit(2),
                Key::Digit(1),
                Key::Digit(1),
                Key::Hash,
            ]))
        );
    }

    #[test]
    fn test_letters_are_keys() {
        assert_eq!(
            parse_line("A").unwrap(),
            Some(Input::Keys(vec![Key::Letter('A')]))
        );
        assert_eq!(
            parse_line("b").unwrap(),
            Some(Input::Keys(vec![Key::Letter('B')]))
        );
    }

    #[rstest]
    #[case("finger")]
    #[case("finger x")]
    #[case("finger 3 4")]
    #[case("2 1x1")]
    fn test_rejects_malformed(#[case] line: &str) {
        assert!(parse_line(line).is_err());
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn test_frame() {
        let rows = vec!["AB".to_string(), "C".to_string()];
        assert_eq!(frame(&rows, true), "+--+\n|AB|\n|C |\n+--+");
        assert!(frame(&rows, false).ends_with("(backlight off)"));
    }

    #[tokio::test]
    async fn test_apply_feeds_devices() {
        use doorlock_hardware::{FingerScan, FingerprintSensor, KeyInput};
        use doorlock_hardware::mock::{MockBiometric, MockKeypad, VirtualLcd};

        let (mut keypad, keypad_handle) = MockKeypad::new();
        let (mut sensor, sensor_handle) = MockBiometric::with_enrolled(&[3]);
        let (_lcd, lcd_handle) = VirtualLcd::new();
        let handles = HostHandles {
            keypad: keypad_handle,
            sensor: sensor_handle,
            lcd: lcd_handle,
        };

        apply(&handles, &Input::Keys(vec![Key::Digit(2), Key::Hash]))
            .await
            .unwrap();
        apply(&handles, &Input::Finger(3)).await.unwrap();
        apply(&handles, &Input::Hold).await.unwrap();

        assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(2)));
        assert_eq!(keypad.poll_key().unwrap(), Some(Key::Hash));
        assert!(matches!(
            sensor.capture_and_identify().unwrap(),
            Some(FingerScan::Matched { id: 3, .. })
        ));
        assert!(sensor.is_finger_present().unwrap());
    }
}
