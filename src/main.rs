// ==========================================
// 电商采购单解析引擎 - 命令行入口
// ==========================================
// 子命令: parse / detect / profiles
// stdout 输出 JSON 结果，日志输出到 stderr
// ==========================================

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use po_ingest::config::{ParserConfig, ProfileStore, SheetSelector};
use po_ingest::domain::FileKind;
use po_ingest::i18n::{set_locale, t, t_with_args};
use po_ingest::importer::{ParseError, PoParser, PurchaseOrderParser};
use po_ingest::logging::{self, LogFormat};
use po_ingest::vendor::VendorRegistry;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "po-ingest")]
#[command(version, about = "Marketplace purchase-order spreadsheet parser", long_about = None)]
struct Cli {
    /// 提示语言（zh-CN / en）
    #[arg(long, global = true, default_value = "zh-CN")]
    locale: String,

    /// 外部平台版式目录（默认: <config_dir>/po-ingest/profiles）
    #[arg(long, global = true)]
    profiles: Option<PathBuf>,

    /// 日志输出为 JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 解析采购单并输出规范 JSON
    Parse {
        /// 采购单文件
        file: PathBuf,

        /// 指定平台 ID（默认按签名识别）
        #[arg(long)]
        vendor: Option<String>,

        /// 文件类型（默认按扩展名）
        #[arg(long)]
        kind: Option<FileKind>,

        /// 解析参数 JSON 文件
        #[arg(long)]
        config: Option<PathBuf>,

        /// 工作表名称（默认第一个）
        #[arg(long)]
        sheet: Option<String>,

        /// 缩进输出
        #[arg(long)]
        pretty: bool,
    },

    /// 仅识别平台
    Detect {
        file: PathBuf,

        #[arg(long)]
        kind: Option<FileKind>,
    },

    /// 列出已注册平台
    Profiles,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    });
    set_locale(&cli.locale);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // 解析错误输出本地化原因
            match err.downcast_ref::<ParseError>() {
                Some(parse_err) => eprintln!("{}", parse_err.user_message()),
                None => eprintln!("{:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let registry = load_registry(cli.profiles.as_deref())?;

    match cli.command {
        Commands::Parse {
            file,
            vendor,
            kind,
            config,
            sheet,
            pretty,
        } => {
            let mut parser_config = match config {
                Some(path) => ParserConfig::from_json_file(&path)?,
                None => ParserConfig::default(),
            }
            .with_env_overrides()?;
            if let Some(name) = sheet {
                parser_config.sheet = SheetSelector::Named(name);
            }

            let (bytes, kind) = read_input(&file, kind)?;
            let parser = PurchaseOrderParser::with_config(&registry, parser_config);
            let result = parser.parse(vendor.as_deref(), &bytes, kind)?;

            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{}", json);
            for warning in &result.warnings {
                eprintln!("{}", warning.user_message());
            }
        }
        Commands::Detect { file, kind } => {
            let (bytes, kind) = read_input(&file, kind)?;
            let config = ParserConfig::default().with_env_overrides()?;
            let parser = PurchaseOrderParser::with_config(&registry, config);
            match parser.detect(&bytes, kind)? {
                Some(id) => println!("{}", t_with_args("cli.detected", &[("vendor", &id)])),
                None => return Err(anyhow!(t("cli.not_detected"))),
            }
        }
        Commands::Profiles => {
            println!("{}:", t("cli.profiles_header"));
            for profile in registry.profiles() {
                println!("  {:<20} {}", profile.id(), profile.profile.display_name);
            }
        }
    }
    Ok(())
}

fn load_registry(dir: Option<&Path>) -> Result<VendorRegistry> {
    let extra = match dir {
        Some(dir) => ProfileStore::new(dir).load()?,
        None => match ProfileStore::default_dir() {
            Some(dir) => ProfileStore::new(dir).load_if_present()?,
            None => Vec::new(),
        },
    };
    Ok(VendorRegistry::with_extra(extra)?)
}

fn read_input(file: &Path, kind: Option<FileKind>) -> Result<(Vec<u8>, FileKind)> {
    let kind = match kind {
        Some(kind) => kind,
        None => FileKind::from_path(file)
            .ok_or_else(|| anyhow!("无法从扩展名判断文件类型: {}", file.display()))?,
    };
    let bytes = std::fs::read(file).with_context(|| format!("读取文件失败: {}", file.display()))?;
    Ok((bytes, kind))
}
