//! WeChat mini program client
//!
//! Previews and uploads go through the `miniprogram-ci` command-line tool.
//! A global install is used when one is on `PATH`, otherwise `npx` fetches it.

mod settings;

pub use settings::CiSettings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use nexus_core::{CommandRunner, ErrorClassifier, Invocation, NexusError, Result};
use nexus_frameworks::{
    PlatformClient, PlatformRequest, PreviewResult, TargetPlatform, UploadResult,
};
use tracing::{debug, info, instrument};

const CI_BIN: &str = "miniprogram-ci";

const DEFAULT_VERSION: &str = "1.0.0";
const DEFAULT_PREVIEW_DESC: &str = "Preview version";
const DEFAULT_UPLOAD_DESC: &str = "Upload version";
const QRCODE_FILE_NAME: &str = "preview-qrcode.png";

/// How `miniprogram-ci` is launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiLauncher {
    pub program: String,
    pub prefix: Vec<String>,
}

impl CiLauncher {
    /// Global install if present, else `npx --yes miniprogram-ci`
    pub fn detect() -> Self {
        match which::which(CI_BIN) {
            Ok(path) => {
                debug!(path = %path.display(), "using installed miniprogram-ci");
                Self::direct(path.display().to_string())
            }
            Err(_) => {
                debug!("miniprogram-ci not on PATH, using npx");
                Self {
                    program: "npx".to_string(),
                    prefix: vec!["--yes".to_string(), CI_BIN.to_string()],
                }
            }
        }
    }

    pub fn direct(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix: Vec::new(),
        }
    }
}

/// WeChat (`weapp`) platform client
pub struct WeappClient {
    runner: Arc<dyn CommandRunner>,
    launcher: CiLauncher,
    classifier: ErrorClassifier,
}

impl WeappClient {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_launcher(runner, CiLauncher::detect())
    }

    pub fn with_launcher(runner: Arc<dyn CommandRunner>, launcher: CiLauncher) -> Self {
        Self {
            runner,
            launcher,
            classifier: ErrorClassifier::platform(),
        }
    }

    /// The private key must exist before anything is spawned
    fn ensure_private_key(&self, path: &Path) -> Result<()> {
        if path.is_file() {
            Ok(())
        } else {
            Err(NexusError::invalid_private_key(&path.display().to_string()))
        }
    }

    /// The tool runs inside the build output, so it has to be there
    fn ensure_project_dir(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            Ok(())
        } else {
            Err(NexusError::file_not_found(path))
        }
    }

    fn check_inputs(&self, request: &PlatformRequest) -> Result<()> {
        self.ensure_private_key(&request.private_key_path)?;
        self.ensure_project_dir(&request.project_path)
    }

    fn invocation(&self, action: &str, request: &PlatformRequest, default_desc: &str) -> Invocation {
        let settings = CiSettings::from_ci_options(&request.ci_options);

        Invocation::new(self.launcher.program.clone(), &request.project_path)
            .args(self.launcher.prefix.iter().cloned())
            .arg(action)
            .args([
                "--appid".to_string(),
                request.app_id.clone(),
                "--project-path".to_string(),
                request.project_path.display().to_string(),
                "--private-key-path".to_string(),
                request.private_key_path.display().to_string(),
                "--upload-version".to_string(),
                version(request).to_string(),
                "--upload-description".to_string(),
                request.desc.clone().unwrap_or_else(|| default_desc.to_string()),
            ])
            .args(settings.to_args())
    }

    /// Run the tool, mapping failures through the platform rules
    async fn run_ci(&self, invocation: &Invocation) -> Result<serde_json::Value> {
        let output = self
            .runner
            .run_checked(invocation)
            .await
            .map_err(|e| self.classifier.to_known(e))?;

        Ok(serde_json::json!({
            "stdout": output.stdout.trim(),
            "stderr": output.stderr.trim(),
        }))
    }
}

fn version(request: &PlatformRequest) -> &str {
    request.version.as_deref().unwrap_or(DEFAULT_VERSION)
}

fn qrcode_path(request: &PlatformRequest) -> PathBuf {
    request
        .qrcode_output_path
        .clone()
        .unwrap_or_else(|| request.project_path.join(QRCODE_FILE_NAME))
}

#[async_trait]
impl PlatformClient for WeappClient {
    fn name(&self) -> &'static str {
        "weapp"
    }

    fn supports(&self, platform: TargetPlatform) -> bool {
        platform == TargetPlatform::Weapp
    }

    #[instrument(skip(self, request), fields(app_id = %request.app_id, project = %request.project_path.display()))]
    async fn preview(&self, request: &PlatformRequest) -> Result<PreviewResult> {
        self.check_inputs(request)?;

        let qrcode = qrcode_path(request);
        let invocation = self
            .invocation("preview", request, DEFAULT_PREVIEW_DESC)
            .args([
                "--qrcode-format".to_string(),
                "image".to_string(),
                "--qrcode-output-dest".to_string(),
                qrcode.display().to_string(),
            ]);

        info!("generating preview QR code");
        let raw = self.run_ci(&invocation).await?;
        info!(qrcode = %qrcode.display(), "preview QR code generated");

        Ok(PreviewResult {
            success: true,
            qrcode_image_path: Some(qrcode),
            raw,
        })
    }

    #[instrument(skip(self, request), fields(app_id = %request.app_id, version = version(request)))]
    async fn upload(&self, request: &PlatformRequest) -> Result<UploadResult> {
        self.check_inputs(request)?;

        let invocation = self.invocation("upload", request, DEFAULT_UPLOAD_DESC);

        info!("uploading code");
        let raw = self.run_ci(&invocation).await?;
        info!("upload completed");

        Ok(UploadResult {
            success: true,
            version: Some(version(request).to_string()),
            raw,
        })
    }
}
