use crate::errors::CliError;
use crate::println_pad;
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use ld_image::BlpImage;
use miette::{IntoDiagnostic, Result};

pub struct ConvertTextureArgs {
    pub input: String,
    pub output: Option<String>,
    pub mipmap: usize,
}

/// `<input stem>.bmp` next to the input file.
fn default_output_path(input: &Utf8Path) -> Utf8PathBuf {
    input.with_extension("bmp")
}

pub async fn convert_texture(args: ConvertTextureArgs) -> Result<()> {
    let input = Utf8PathBuf::from(args.input);
    let output = args
        .output
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| default_output_path(&input));

    let bytes = match tokio::fs::read(input.as_std_path()).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CliError::file_not_found(input).into());
        }
        Err(e) => return Err(CliError::from(e).into()),
    };

    let level = args.mipmap;
    let (width, height, bitmap) = {
        let input = input.clone();
        tokio::task::spawn_blocking(move || {
            let image =
                BlpImage::from_bytes(&bytes).map_err(|e| CliError::convert_failed(input.clone(), e))?;
            let mipmap = image
                .decode_mipmap(level)
                .map_err(|e| CliError::convert_failed(input.clone(), e))?;
            let bitmap = mipmap
                .to_bitmap()
                .map_err(|e| CliError::convert_failed(input, e))?;
            Ok::<_, CliError>((mipmap.width, mipmap.height, bitmap))
        })
        .await
        .into_diagnostic()??
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_str().is_empty()) {
        tokio::fs::create_dir_all(parent.as_std_path())
            .await
            .map_err(CliError::from)?;
    }
    tokio::fs::write(output.as_std_path(), bitmap)
        .await
        .map_err(CliError::from)?;

    println_pad!(
        "{} {} {}",
        "🖼️ Mipmap".bright_blue().bold(),
        level.to_string().bright_cyan().bold(),
        format!("({}x{})", width, height).dimmed()
    );
    println_pad!(
        "{} {}",
        "📁 Written to:".bright_yellow(),
        output.as_str().bright_white().bold()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_replaces_extension() {
        assert_eq!(
            default_output_path(Utf8Path::new("textures/icon.blp")),
            Utf8PathBuf::from("textures/icon.bmp")
        );
    }

    #[tokio::test]
    async fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("nope.blp").to_string_lossy().into_owned();
        let result = convert_texture(ConvertTextureArgs {
            input,
            output: None,
            mipmap: 0,
        })
        .await;
        assert!(result.is_err());
    }
}
