//! Minimal WFDB reader: header sampling frequency and MIT-format annotations
//!
//! Only what the pipeline needs is decoded. The signal file (`.dat`) is never
//! read; beat positions come from the annotation file and the sampling
//! frequency from the header's record line.

/// Default sampling frequency when a header omits it (WFDB convention).
pub const DEFAULT_SAMPLING_FREQUENCY: f64 = 250.0;

// MIT annotation pseudo-codes
const SKIP: u16 = 59;
const NUM: u16 = 60;
const SUB: u16 = 61;
const CHN: u16 = 62;
const AUX: u16 = 63;

/// Annotation codes that mark a QRS complex (WFDB `isqrs`).
const QRS_CODES: &[u8] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 25, 30, 34, 35, 38];

/// Parsed record line of a WFDB header
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderInfo {
    pub record_name: String,
    pub num_signals: usize,
    pub sampling_frequency: f64,
    pub num_samples: Option<u64>,
}

/// One decoded annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    /// Sample index
    pub sample: u64,
    /// WFDB annotation code
    pub code: u8,
}

impl Annotation {
    pub fn is_beat(&self) -> bool {
        QRS_CODES.contains(&self.code)
    }
}

/// Parse the record line of a `.hea` file.
///
/// Format: `name[/segments] nsig [fs[/counter[(base)]] [nsamp ...]]`.
/// Comment lines (`#`) and blank lines before the record line are skipped.
pub fn parse_header(content: &str) -> Result<HeaderInfo, String> {
    let line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .ok_or_else(|| "header has no record line".to_string())?;

    let mut tokens = line.split_whitespace();
    let record_name = tokens
        .next()
        .map(|t| t.split('/').next().unwrap_or(t).to_string())
        .ok_or_else(|| "missing record name".to_string())?;

    let num_signals = match tokens.next() {
        Some(t) => t
            .parse::<usize>()
            .map_err(|_| format!("invalid signal count '{t}'"))?,
        None => return Err("missing signal count".into()),
    };

    let sampling_frequency = match tokens.next() {
        Some(t) => {
            let fs_part = t.split(['/', '(']).next().unwrap_or(t);
            let fs = fs_part
                .parse::<f64>()
                .map_err(|_| format!("invalid sampling frequency '{t}'"))?;
            if !(fs.is_finite() && fs > 0.0) {
                return Err(format!("non-positive sampling frequency '{t}'"));
            }
            fs
        }
        None => DEFAULT_SAMPLING_FREQUENCY,
    };

    let num_samples = tokens.next().and_then(|t| t.parse::<u64>().ok());

    Ok(HeaderInfo {
        record_name,
        num_signals,
        sampling_frequency,
        num_samples,
    })
}

/// Decode an MIT-format annotation file.
///
/// Each entry is a little-endian 16-bit word: the top 6 bits are the code,
/// the low 10 bits the sample delta since the previous annotation. `SKIP`
/// carries a 32-bit delta in the next 4 bytes (high word first), `AUX`
/// is followed by `delta` bytes padded to an even length, and a zero word
/// ends the file.
pub fn parse_annotations(bytes: &[u8]) -> Result<Vec<Annotation>, String> {
    let mut annotations = Vec::new();
    let mut time: i64 = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        let word = u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        i += 2;
        let code = word >> 10;
        let delta = (word & 0x3FF) as i64;

        match code {
            0 if delta == 0 => break,
            SKIP => {
                if i + 4 > bytes.len() {
                    return Err(format!("truncated SKIP at byte {}", i - 2));
                }
                let high = u16::from_le_bytes([bytes[i], bytes[i + 1]]) as u32;
                let low = u16::from_le_bytes([bytes[i + 2], bytes[i + 3]]) as u32;
                time += ((high << 16) | low) as i32 as i64;
                i += 4;
            }
            NUM | SUB | CHN => {}
            AUX => {
                let len = delta as usize;
                i += len + (len & 1);
            }
            _ => {
                time += delta;
                if time < 0 {
                    return Err(format!("negative annotation time at byte {}", i - 2));
                }
                annotations.push(Annotation {
                    sample: time as u64,
                    code: code as u8,
                });
            }
        }
    }

    Ok(annotations)
}

/// Sample positions of the beat annotations, in file order.
///
/// Only QRS beat codes count. Rhythm changes, comments and other non-beat
/// annotations are dropped rather than kept as positions.
pub fn beat_positions(annotations: &[Annotation]) -> Vec<u64> {
    annotations
        .iter()
        .filter(|a| a.is_beat())
        .map(|a| a.sample)
        .collect()
}

/// Encode beat annotations in MIT format. Used to write fixtures and by
/// tools that export cleaned annotation sets.
pub fn encode_annotations(annotations: &[Annotation]) -> Vec<u8> {
    let mut out = Vec::with_capacity(annotations.len() * 2 + 2);
    let mut previous: u64 = 0;

    for ann in annotations {
        let delta = ann.sample.saturating_sub(previous);
        if delta > 0x3FF {
            let skip = (SKIP << 10).to_le_bytes();
            out.extend_from_slice(&skip);
            let interval = delta as u32;
            out.extend_from_slice(&((interval >> 16) as u16).to_le_bytes());
            out.extend_from_slice(&((interval & 0xFFFF) as u16).to_le_bytes());
            out.extend_from_slice(&((ann.code as u16) << 10).to_le_bytes());
        } else {
            let word = ((ann.code as u16) << 10) | delta as u16;
            out.extend_from_slice(&word.to_le_bytes());
        }
        previous = ann.sample;
    }

    out.extend_from_slice(&[0, 0]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_basic() {
        let hea = "16265 2 128 11730944\n16265.dat 212 200 11 1024 -53 0 0 ECG1\n";
        let info = parse_header(hea).unwrap();
        assert_eq!(info.record_name, "16265");
        assert_eq!(info.num_signals, 2);
        assert_eq!(info.sampling_frequency, 128.0);
        assert_eq!(info.num_samples, Some(11730944));
    }

    #[test]
    fn test_parse_header_counter_frequency_and_comments() {
        let hea = "# generated\n\nn01/3 2 250/1000(0) 7680\n";
        let info = parse_header(hea).unwrap();
        assert_eq!(info.record_name, "n01");
        assert_eq!(info.sampling_frequency, 250.0);
    }

    #[test]
    fn test_parse_header_default_frequency() {
        let info = parse_header("a01 1\n").unwrap();
        assert_eq!(info.sampling_frequency, DEFAULT_SAMPLING_FREQUENCY);
        assert_eq!(info.num_samples, None);
    }

    #[test]
    fn test_parse_header_errors() {
        assert!(parse_header("").is_err());
        assert!(parse_header("a01 x 128").is_err());
        assert!(parse_header("a01 1 0").is_err());
        assert!(parse_header("a01 1 abc").is_err());
    }

    #[test]
    fn test_parse_simple_annotations() {
        // NORMAL (1) at +100, +128, +128 then EOF
        let mut bytes = Vec::new();
        for delta in [100_u16, 128, 128] {
            bytes.extend_from_slice(&((1 << 10) | delta).to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);

        let anns = parse_annotations(&bytes).unwrap();
        assert_eq!(beat_positions(&anns), vec![100, 228, 356]);
    }

    #[test]
    fn test_skip_aux_and_non_beats() {
        let mut bytes = Vec::new();
        // SKIP by 70000 samples
        bytes.extend_from_slice(&(SKIP << 10).to_le_bytes());
        bytes.extend_from_slice(&1_u16.to_le_bytes());
        bytes.extend_from_slice(&(70000_u32 & 0xFFFF).to_le_bytes()[..2]);
        // NORMAL with delta 0 lands exactly at 70000
        bytes.extend_from_slice(&(1_u16 << 10).to_le_bytes());
        // rhythm annotation (+, code 28) at +10 with 3-byte AUX "(N\0"
        bytes.extend_from_slice(&((28_u16 << 10) | 10).to_le_bytes());
        bytes.extend_from_slice(&((AUX << 10) | 3).to_le_bytes());
        bytes.extend_from_slice(b"(N\0\0");
        // SUB pseudo-annotation is ignored
        bytes.extend_from_slice(&((SUB << 10) | 1).to_le_bytes());
        // NORMAL at +90
        bytes.extend_from_slice(&((1_u16 << 10) | 90).to_le_bytes());
        bytes.extend_from_slice(&[0, 0]);

        let anns = parse_annotations(&bytes).unwrap();
        assert_eq!(anns.len(), 3);
        assert_eq!(anns[1].code, 28);
        assert_eq!(anns[1].sample, 70010);
        assert_eq!(beat_positions(&anns), vec![70000, 70100]);
    }

    #[test]
    fn test_truncated_skip_is_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(SKIP << 10).to_le_bytes());
        bytes.extend_from_slice(&[1, 0]);
        assert!(parse_annotations(&bytes).is_err());
    }

    #[test]
    fn test_encode_then_parse_with_long_gaps() {
        let anns = vec![
            Annotation { sample: 5, code: 1 },
            Annotation { sample: 3000, code: 1 },
            Annotation { sample: 3100, code: 5 },
        ];
        let decoded = parse_annotations(&encode_annotations(&anns)).unwrap();
        assert_eq!(decoded, anns);
    }
}
