//! Windows backend using `SendInput`
//!
//! Characters go out as `KEYEVENTF_UNICODE` packets (one key-down/key-up
//! pair per UTF-16 unit), so the active keyboard layout does not matter.

use std::mem::size_of;

use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, VIRTUAL_KEY, VK_RETURN, VK_SPACE, VK_TAB,
};

use super::{InjectError, KeystrokeInjector, NamedKey};

#[derive(Debug, Default)]
pub struct SendInputInjector;

impl SendInputInjector {
    pub fn new() -> Self {
        Self
    }
}

fn keyboard_input(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(inputs: &[INPUT]) -> Result<(), InjectError> {
    // SAFETY: `inputs` is a valid slice of fully initialized keyboard INPUTs
    let sent = unsafe { SendInput(inputs, size_of::<INPUT>() as i32) };
    let expected = inputs.len() as u32;

    if sent != expected {
        return Err(InjectError::Partial {
            sent,
            expected,
            detail: windows::core::Error::from_win32().to_string(),
        });
    }
    Ok(())
}

impl KeystrokeInjector for SendInputInjector {
    fn name(&self) -> &str {
        "sendinput"
    }

    fn press_char(&mut self, ch: char) -> Result<(), InjectError> {
        let mut units = [0u16; 2];
        let inputs: Vec<INPUT> = ch
            .encode_utf16(&mut units)
            .iter()
            .flat_map(|&unit| {
                [
                    keyboard_input(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE),
                    keyboard_input(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP),
                ]
            })
            .collect();

        send(&inputs)
    }

    fn press_key(&mut self, key: NamedKey) -> Result<(), InjectError> {
        let vk = match key {
            NamedKey::Space => VK_SPACE,
            NamedKey::Enter => VK_RETURN,
            NamedKey::Tab => VK_TAB,
        };

        send(&[
            keyboard_input(vk, 0, KEYBD_EVENT_FLAGS(0)),
            keyboard_input(vk, 0, KEYEVENTF_KEYUP),
        ])
    }
}
