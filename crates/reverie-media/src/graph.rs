//! Encoder argument construction for the layer composition.
//!
//! Pure functions from already-resolved local paths to an FFmpeg argument
//! list. The graph is a fixed conditional shape: the two base layers are
//! always blended, an overlay is composited on top when present, and an
//! audio track is attached when present.

use std::path::{Path, PathBuf};

/// Local paths of the input layers for one composition.
#[derive(Debug, Clone)]
pub struct LayerPaths {
    pub sky: PathBuf,
    pub ground: PathBuf,
    pub overlay: Option<PathBuf>,
    pub audio: Option<PathBuf>,
}

impl LayerPaths {
    /// Base layers only.
    pub fn new(sky: impl Into<PathBuf>, ground: impl Into<PathBuf>) -> Self {
        Self {
            sky: sky.into(),
            ground: ground.into(),
            overlay: None,
            audio: None,
        }
    }

    pub fn with_overlay(mut self, path: impl Into<PathBuf>) -> Self {
        self.overlay = Some(path.into());
        self
    }

    pub fn with_audio(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio = Some(path.into());
        self
    }
}

/// A fully built encoder invocation: argument list plus expected output.
#[derive(Debug, Clone)]
pub struct EncodeArgs {
    pub args: Vec<String>,
    pub output: PathBuf,
}

/// Build the encoder argument list for one composition.
///
/// The output is always H.264/yuv420p and hard-clipped to `duration_sec`;
/// with audio attached, `-shortest` additionally stops at the first
/// exhausted stream, so a shorter audio track shortens the output.
pub fn build_encode_args(layers: &LayerPaths, duration_sec: u32, output: &Path) -> EncodeArgs {
    let mut args: Vec<String> = vec!["-y".into(), "-v".into(), "error".into()];

    let mut push_input = |path: &Path| {
        args.push("-i".into());
        args.push(path.to_string_lossy().into_owned());
    };
    push_input(&layers.sky);
    push_input(&layers.ground);
    let mut input_count = 2u32;
    if let Some(overlay) = &layers.overlay {
        push_input(overlay);
        input_count += 1;
    }
    if let Some(audio) = &layers.audio {
        push_input(audio);
        input_count += 1;
    }

    let compose = if layers.overlay.is_some() {
        "[bg][2:v]overlay[outv]"
    } else {
        "[bg]copy[outv]"
    };
    let filter_complex = format!("[0:v][1:v]blend=all_mode=screen[bg];{compose}");

    args.push("-filter_complex".into());
    args.push(filter_complex);
    args.push("-map".into());
    args.push("[outv]".into());

    if layers.audio.is_some() {
        // The audio file is always the last input.
        args.push("-map".into());
        args.push(format!("{}:a", input_count - 1));
        args.push("-c:a".into());
        args.push("aac".into());
        args.push("-shortest".into());
    }

    args.extend(
        [
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-t",
            &duration_sec.to_string(),
        ]
        .map(String::from),
    );
    args.push(output.to_string_lossy().into_owned());

    EncodeArgs {
        args,
        output: output.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_layers() -> LayerPaths {
        LayerPaths::new("/ws/sky.mp4", "/ws/ground.mp4")
    }

    fn joined(encode: &EncodeArgs) -> String {
        encode.args.join(" ")
    }

    #[test]
    fn test_base_only_graph_has_no_optional_stages() {
        let encode = build_encode_args(&base_layers(), 10, Path::new("/ws/output.mp4"));
        let line = joined(&encode);

        assert!(line.contains("[0:v][1:v]blend=all_mode=screen[bg];[bg]copy[outv]"));
        assert!(!line.contains("overlay"));
        assert!(!line.contains("-c:a"));
        assert!(!line.contains("-shortest"));
        assert_eq!(encode.args.iter().filter(|a| *a == "-i").count(), 2);
    }

    #[test]
    fn test_full_graph_composites_overlay_and_attaches_audio() {
        let layers = base_layers()
            .with_overlay("/ws/overlay.webm")
            .with_audio("/ws/audio.mp3");
        let encode = build_encode_args(&layers, 10, Path::new("/ws/output.mp4"));
        let line = joined(&encode);

        assert!(line.contains("[bg][2:v]overlay[outv]"));
        // Audio is the 4th input, mapped by index, clipped to the shorter stream.
        assert!(line.contains("-map 3:a"));
        assert!(line.contains("-c:a aac"));
        assert!(line.contains("-shortest"));
        assert_eq!(encode.args.iter().filter(|a| *a == "-i").count(), 4);
    }

    #[test]
    fn test_audio_without_overlay_maps_third_input() {
        let layers = base_layers().with_audio("/ws/audio.mp3");
        let encode = build_encode_args(&layers, 10, Path::new("/ws/output.mp4"));
        let line = joined(&encode);

        assert!(line.contains("[bg]copy[outv]"));
        assert!(line.contains("-map 2:a"));
    }

    #[test]
    fn test_fixed_codec_and_duration_clip() {
        let encode = build_encode_args(&base_layers(), 25, Path::new("/ws/output.mp4"));
        let line = joined(&encode);

        assert!(line.contains("-c:v libx264"));
        assert!(line.contains("-pix_fmt yuv420p"));
        assert!(line.contains("-t 25"));
        assert!(line.ends_with("/ws/output.mp4"));
        assert_eq!(encode.output, PathBuf::from("/ws/output.mp4"));
    }
}
