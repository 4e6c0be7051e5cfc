// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `data_coding` aware conversion between message octets and text.

/// SMSC default alphabet; the bridge treats it as ASCII/UTF-8.
pub const DC_DEFAULT: u8 = 0x00;
/// ISO-8859-1.
pub const DC_LATIN1: u8 = 0x03;
/// UCS-2, sent as UTF-16BE.
pub const DC_UCS2: u8 = 0x08;

/// Decodes message octets according to `data_coding`.
///
/// Unrecognised schemes fall back to lossy UTF-8.
pub fn decode_text(data_coding: u8, octets: &[u8]) -> String {
    match data_coding {
        DC_UCS2 => {
            let units: Vec<u16> = octets
                .chunks(2)
                .map(|pair| match pair {
                    [hi, lo] => u16::from_be_bytes([*hi, *lo]),
                    [odd] => u16::from(*odd),
                    _ => 0,
                })
                .collect();
            String::from_utf16_lossy(&units)
        }
        DC_LATIN1 => octets.iter().map(|b| char::from(*b)).collect(),
        _ => String::from_utf8_lossy(octets).into_owned(),
    }
}

/// Picks the narrowest encoding for `text`: the default alphabet for pure
/// ASCII, UCS-2 otherwise.
pub fn encode_text(text: &str) -> (u8, Vec<u8>) {
    if text.is_ascii() {
        (DC_DEFAULT, text.as_bytes().to_vec())
    } else {
        let octets = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
        (DC_UCS2, octets)
    }
}
