//! Creative media derived from an analysis
//!
//! Prompt builders for the logo, narration and video pitch, plus the
//! conversions that turn provider payloads into data URIs.

use base64::Engine;

use crate::analysis::AnalysisResult;

/// The three media kinds a context can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Logo,
    Audio,
    Video,
}

impl MediaKind {
    pub fn name(self) -> &'static str {
        match self {
            MediaKind::Logo => "logo",
            MediaKind::Audio => "audio summary",
            MediaKind::Video => "video pitch",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const DEFAULT_PCM_RATE: u32 = 24_000;

/// Short description for the text-to-image model.
pub fn logo_prompt(analysis: &AnalysisResult) -> String {
    format!(
        "A clean, modern, minimalist logo for a software project. The project: {} \
         Built with {}. Flat vector style, simple geometric shapes, centered on a plain background, no text.",
        analysis.main_objective.trim(),
        analysis.language_framework.trim()
    )
}

/// Narration text for speech synthesis.
pub fn narration_text(analysis: &AnalysisResult) -> String {
    format!(
        "Here is a quick overview of this project. {} {}",
        ensure_sentence(&analysis.main_objective),
        ensure_sentence(&analysis.technical_purpose)
    )
    .trim()
    .to_string()
}

/// Prompt for the text-to-video model.
pub fn video_prompt(analysis: &AnalysisResult) -> String {
    format!(
        "A short, upbeat, cinematic product pitch video for a software tool. {} \
         Sleek abstract visuals of code and data flowing, modern tech aesthetic.",
        ensure_sentence(&analysis.main_objective)
    )
}

fn ensure_sentence(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() || text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

/// `data:{mime};base64,{payload}` from an already base64-encoded payload.
pub fn data_uri(mime_type: &str, base64_payload: &str) -> String {
    format!("data:{mime_type};base64,{base64_payload}")
}

/// Split a base64 data URI into its MIME type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .ok()?;
    Some((mime.to_string(), bytes))
}

/// Sample rate advertised in an `audio/L16;codec=pcm;rate=24000` style MIME type.
pub fn pcm_sample_rate(mime_type: &str) -> u32 {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
        .unwrap_or(DEFAULT_PCM_RATE)
}

/// Wrap raw 16-bit little-endian mono PCM in a WAV (RIFF) container.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    const CHANNELS: u16 = 1;
    const BITS_PER_SAMPLE: u16 = 16;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate * u32::from(block_align);
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&CHANNELS.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}

/// Turn a TTS inline payload into a playable data URI.
///
/// Raw PCM (`audio/L16`, `audio/pcm`) is wrapped in WAV; anything else is kept as is.
pub fn audio_data_uri(mime_type: &str, base64_payload: &str) -> Result<String, String> {
    let lower = mime_type.to_ascii_lowercase();
    if !(lower.starts_with("audio/l16") || lower.starts_with("audio/pcm")) {
        return Ok(data_uri(mime_type, base64_payload));
    }

    let engine = base64::engine::general_purpose::STANDARD;
    let pcm = engine
        .decode(base64_payload.as_bytes())
        .map_err(|e| format!("invalid audio payload: {e}"))?;
    let wav = pcm_to_wav(&pcm, pcm_sample_rate(mime_type));
    Ok(data_uri("audio/wav", &engine.encode(wav)))
}

/// File extension matching a media MIME type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.split(';').next().unwrap_or("").trim() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/mpeg" => "mp3",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            role: "r".to_string(),
            language_framework: "Rust / Tokio".to_string(),
            main_objective: "Serve files over HTTP".to_string(),
            technical_purpose: "Uses an async runtime.".to_string(),
            key_features: vec![],
            structure_classes: vec![],
            structure_functions: vec![],
            dependencies: vec![],
            grounding_links: None,
        }
    }

    #[test]
    fn test_prompts_use_analysis_fields() {
        let a = analysis();
        let logo = logo_prompt(&a);
        assert!(logo.contains("Serve files over HTTP"));
        assert!(logo.contains("Rust / Tokio"));

        assert_eq!(
            narration_text(&a),
            "Here is a quick overview of this project. Serve files over HTTP. Uses an async runtime."
        );

        assert!(video_prompt(&a).contains("Serve files over HTTP."));
    }

    #[test]
    fn test_data_uri_round_trip() {
        let uri = data_uri("image/png", "aGk=");
        assert_eq!(uri, "data:image/png;base64,aGk=");
        assert_eq!(
            decode_data_uri(&uri),
            Some(("image/png".to_string(), b"hi".to_vec()))
        );
        assert!(decode_data_uri("https://example.com/x.png").is_none());
    }

    #[test]
    fn test_pcm_sample_rate() {
        assert_eq!(pcm_sample_rate("audio/L16;codec=pcm;rate=16000"), 16000);
        assert_eq!(pcm_sample_rate("audio/L16"), 24000);
    }

    #[test]
    fn test_pcm_to_wav_header() {
        let pcm = vec![0u8; 10];
        let wav = pcm_to_wav(&pcm, 24000);
        assert_eq!(wav.len(), 54);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 46);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 24000);
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 48000);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 10);
    }

    #[test]
    fn test_audio_data_uri_wraps_pcm() {
        let uri = audio_data_uri("audio/L16;codec=pcm;rate=24000", "AAAA").unwrap();
        assert!(uri.starts_with("data:audio/wav;base64,"));
        let (mime, bytes) = decode_data_uri(&uri).unwrap();
        assert_eq!(mime, "audio/wav");
        assert_eq!(bytes.len(), 44 + 3);
    }

    #[test]
    fn test_audio_data_uri_keeps_encoded_formats() {
        assert_eq!(
            audio_data_uri("audio/mpeg", "AAAA").unwrap(),
            "data:audio/mpeg;base64,AAAA"
        );
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("audio/wav"), "wav");
        assert_eq!(extension_for_mime("application/zip"), "bin");
    }
}
