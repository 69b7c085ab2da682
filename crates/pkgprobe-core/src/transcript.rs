//! Carves a single command's output out of the console transcript.
//!
//! The transcript is append-only and unstructured. The only anchors are the install
//! invocation the console echoes back and the idle prompt printed once the command is done.

use crate::models::ExtractionResult;

pub const INSTALL_SCRIPT_ECHO: &str = "Install.ps1\"";
pub const IDLE_PROMPT: &str = "PM>";

/// `Install.ps1" "<id>"`, the tail of the echoed install invocation.
pub fn install_echo_signature(package_id: &str) -> String {
    format!("{INSTALL_SCRIPT_ECHO} \"{package_id}\"")
}

/// Returns the text strictly between the first echoed install invocation for `package_id`
/// and the next idle prompt. Matching ignores ASCII case.
pub fn extract(transcript: &str, package_id: &str) -> ExtractionResult {
    let signature = install_echo_signature(package_id);

    let Some(start) = find_ignore_ascii_case(transcript, &signature, 0) else {
        return ExtractionResult::missing();
    };
    let body_start = start + signature.len();

    let Some(end) = find_ignore_ascii_case(transcript, IDLE_PROMPT, body_start) else {
        return ExtractionResult::missing();
    };

    ExtractionResult::found(&transcript[body_start..end])
}

fn find_ignore_ascii_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }

    let needle = needle.as_bytes();
    haystack.as_bytes()[from..]
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|offset| offset + from)
}

#[cfg(test)]
mod tests {
    use super::{extract, find_ignore_ascii_case, install_echo_signature};

    #[test]
    fn signature_quotes_the_package_id() {
        assert_eq!(install_echo_signature("Foo"), "Install.ps1\" \"Foo\"");
    }

    #[test]
    fn extracts_text_between_invocation_and_prompt() {
        let result = extract("Install.ps1\" \"Foo\" result-text PM> next-prompt", "Foo");
        assert!(result.found);
        assert_eq!(result.text.as_deref(), Some(" result-text "));
    }

    #[test]
    fn matching_ignores_case() {
        let transcript = "PM> & \"C:\\s\\INSTALL.PS1\" \"foo\" \"False\"\nAdded 'Foo 1.0'\npm> ";
        let result = extract(transcript, "Foo");
        assert!(result.found);
        assert_eq!(result.text.as_deref(), Some(" \"False\"\nAdded 'Foo 1.0'\n"));
    }

    #[test]
    fn prompt_before_the_invocation_is_not_a_terminator() {
        let transcript = "PM> clear\nPM> & \"Install.ps1\" \"Foo\" \"True\"\ndone\nPM>";
        let result = extract(transcript, "Foo");
        assert_eq!(result.text.as_deref(), Some(" \"True\"\ndone\n"));
    }

    #[test]
    fn first_invocation_wins() {
        let transcript = "Install.ps1\" \"Foo\" first PM> Install.ps1\" \"Foo\" second PM>";
        assert_eq!(extract(transcript, "Foo").text.as_deref(), Some(" first "));
    }

    #[test]
    fn degenerate_transcripts_are_misses() {
        for transcript in [
            "",
            "PM>",
            "nothing of interest",
            "Install.ps1\" \"Foo\" still running",
            "Install.ps1\" \"Foo\"",
            "Install.ps1\" \"Bar\" other PM>",
        ] {
            let result = extract(transcript, "Foo");
            assert!(!result.found, "transcript {transcript:?}");
            assert_eq!(result.text, None);
        }
    }

    #[test]
    fn non_ascii_output_keeps_char_boundaries() {
        let transcript = "Install.ps1\" \"Foo\" Paket installiert \u{2713} PM>";
        assert_eq!(
            extract(transcript, "Foo").text.as_deref(),
            Some(" Paket installiert \u{2713} ")
        );
    }

    #[test]
    fn search_start_past_end_is_not_found() {
        assert_eq!(find_ignore_ascii_case("PM>", "PM>", 3), None);
        assert_eq!(find_ignore_ascii_case("PM>", "PM>", 0), Some(0));
    }

    #[test]
    fn extraction_is_repeatable() {
        let transcript = "x Install.ps1\" \"Foo\" body PM> y";
        assert_eq!(extract(transcript, "Foo"), extract(transcript, "Foo"));
    }
}
