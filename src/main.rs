use clap::{Parser, Subcommand};
use comfy_table::{Attribute, Cell, Table};
use directories::{BaseDirs, ProjectDirs};
use inquire::{Confirm, MultiSelect, Select, Text};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use solar_quote::calc;
use solar_quote::error::QuoteError;
use solar_quote::model::{LineItem, QuotationRequest, SenderConfig, TariffTable};
use solar_quote::quote::{
    DEFAULT_TEMPLATE, QuotationRenderer, format_capacity, format_krw, format_quantity, kst_now,
};
use solar_quote::tariff::DEFAULT_TARIFF;

// ==========================================
// Constants & Embeds
// ==========================================

// Embed default sender details at compile time to ensure availability
const DEFAULT_SENDER: &str = include_str!("../sender.toml");

const TEMPLATE_FILE: &str = "quotation.tera";

// ==========================================
// Structs & Enums
// ==========================================

#[derive(Debug, Serialize, Deserialize)]
struct AppSettings {
    data_root: String,
}

#[derive(Parser)]
#[command(name = "solar-quote")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new quotation
    New,
    /// Show the configured tariff table
    Tariff,
    /// List generated quotations
    List,
    /// Open output folder
    Open,
    /// Configure data directory
    Config,
}

// ==========================================
// Main Function
// ==========================================

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // 1. Initialize configuration
    let settings = load_settings().unwrap_or_else(setup_config_wizard);
    let expanded_path = expand_home_dir(&settings.data_root);
    let root = PathBuf::from(expanded_path);

    if let Err(e) = fs::create_dir_all(root.join("output")) {
        eprintln!("❌ Error: Failed to create data directory: {}", e);
        return;
    }

    if cli.command.is_none() {
        use clap::CommandFactory;
        Cli::command().print_help().unwrap();
        return;
    }

    match cli.command.unwrap() {
        Commands::New => new_quotation(&root),
        Commands::Tariff => show_tariff(&root),
        Commands::List => list_quotations(&root),
        Commands::Open => open_folder_wizard(&root),
        Commands::Config => {
            setup_config_wizard();
        }
    }
}

// ==========================================
// 1. Quotation Wizard
// ==========================================

fn new_quotation(root: &Path) {
    let tariff = load_tariff_config(root);
    let sender = load_sender_config(root);

    let selected = match MultiSelect::new("분석할 항목을 선택하세요 (중복 선택 가능):", tariff.names())
        .prompt()
    {
        Ok(s) if !s.is_empty() => s,
        Ok(_) => {
            println!("❌ No categories selected. Aborting.");
            return;
        }
        Err(_) => std::process::exit(0),
    };

    let mut items: Vec<LineItem> = Vec::new();
    for name in &selected {
        let quantity = prompt_quantity(&tariff, name);
        match calc::compute_line_item(&tariff, name, quantity) {
            Ok(item) => items.push(item),
            Err(e) => println!("⚠️  {}: {}", name, e),
        }
    }

    if items.is_empty() {
        println!("❌ No items entered. Aborting.");
        return;
    }

    print_summary(&items);

    let proceed = Confirm::new("정식 견적서를 발행할까요?")
        .with_default(true)
        .prompt()
        .unwrap_or(false);
    if !proceed {
        println!("Cancelled");
        return;
    }

    let recipient = Text::new("고객사명 (또는 성함):")
        .with_placeholder("예: (주)대한산업")
        .prompt()
        .unwrap_or_default();

    let request = QuotationRequest {
        recipient_name: recipient,
        sender,
        generated_at: kst_now(),
        line_items: items,
    };

    generate_document(root, &request);
}

fn prompt_quantity(tariff: &TariffTable, name: &str) -> f64 {
    let unit_label = tariff
        .lookup(name)
        .map(|c| c.unit_label.clone())
        .unwrap_or_default();

    loop {
        let raw = Text::new(&format!("{} — {} 입력:", name, unit_label))
            .with_default("0")
            .prompt()
            .unwrap_or_else(|_| std::process::exit(0));

        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => return v,
            _ => println!("⚠️  0 이상의 숫자를 입력해 주세요."),
        }
    }
}

// ==========================================
// 2. Console Summary
// ==========================================

fn print_summary(items: &[LineItem]) {
    let totals = calc::aggregate(items);

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("구분"),
        Cell::new("사업 규모"),
        Cell::new("예상 설치 용량"),
        Cell::new("연간 임대료"),
    ]);

    for item in items {
        table.add_row(vec![
            Cell::new(&item.category),
            Cell::new(format!(
                "{} {}",
                format_quantity(item.input_quantity),
                item.unit_label
            )),
            Cell::new(format_capacity(item.capacity_kw)),
            Cell::new(format!("{} 원", format_krw(item.annual_rent))),
        ]);
    }

    table.add_row(vec![
        Cell::new("총 합계").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(format_capacity(totals.total_capacity_kw)).add_attribute(Attribute::Bold),
        Cell::new(format!("{} 원", format_krw(totals.total_annual_rent)))
            .add_attribute(Attribute::Bold),
    ]);

    println!("\n--- 종합 분석 요약 ---");
    println!("{table}");
    println!(
        "월 평균 임대료: {} 원\n",
        format_krw(totals.monthly_average_rent)
    );
}

// ==========================================
// 3. Document Generation
// ==========================================

fn generate_document(root: &Path, request: &QuotationRequest) {
    // Initialize template (user-editable copy under the data root)
    let template_dir = root.join("templates");
    if !template_dir.exists() {
        fs::create_dir_all(&template_dir).unwrap();
    }
    let template_path = template_dir.join(TEMPLATE_FILE);
    if !template_path.exists() {
        println!("✨ Initializing default template...");
        fs::write(&template_path, DEFAULT_TEMPLATE).expect("Failed to write default template");
    }
    let template_src =
        fs::read_to_string(&template_path).unwrap_or_else(|_| DEFAULT_TEMPLATE.to_string());

    let renderer = match QuotationRenderer::from_template(&template_src) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Template Error: {}", e);
            return;
        }
    };

    // Optional company mark. The path is referenced from output/<year>/.
    let logo_file = root.join("assets").join("logo.png");
    let logo = logo_file.exists().then_some("../../assets/logo.png");

    let document = match renderer.render(request, logo) {
        Ok(doc) => doc,
        Err(e @ QuoteError::MissingRecipient) => {
            eprintln!("❌ {}", e);
            return;
        }
        Err(e) => {
            eprintln!("❌ 견적서 생성 중 오류가 발생했습니다: {}", e);
            return;
        }
    };

    let year_dir = root
        .join("output")
        .join(request.generated_at.format("%Y").to_string());
    fs::create_dir_all(&year_dir).unwrap();

    let stem = unique_stem(&year_dir, &document.file_stem);
    let typ_path = year_dir.join(format!("{}.typ", stem));
    let pdf_path = year_dir.join(format!("{}.pdf", stem));

    fs::write(&typ_path, &document.bytes).expect("Failed to write .typ file");
    info!("quotation source written to {:?}", typ_path);
    println!("📄 Quotation source: {:?}", typ_path);

    compile_pdf(root, &typ_path, &pdf_path);
}

// Same-recipient quotations on the same data root collide on the stem;
// scan for the highest existing index and go one past it.
fn unique_stem(output_dir: &Path, base: &str) -> String {
    let mut next_idx = 1;
    if let Ok(entries) = fs::read_dir(output_dir) {
        for entry in entries.flatten() {
            let fname = entry.file_name();
            let fname_str = fname.to_string_lossy();
            if let Some(rest) = fname_str.strip_prefix(base) {
                if rest.starts_with('.') {
                    if next_idx == 1 {
                        next_idx = 2;
                    }
                } else if let Some(num) = rest.strip_prefix('-') {
                    let num_part: String = num.chars().take_while(|c| c.is_numeric()).collect();
                    if let Ok(idx) = num_part.parse::<u32>() {
                        if idx >= next_idx {
                            next_idx = idx + 1;
                        }
                    }
                }
            }
        }
    }

    if next_idx == 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, next_idx)
    }
}

fn compile_pdf(root: &Path, typ_path: &Path, pdf_path: &Path) {
    // Check if Typst is installed
    if Command::new("typst").arg("--version").output().is_err() {
        println!(
            "⚠️  'typst' is not installed (brew install typst). Kept the .typ source at {:?}.",
            typ_path
        );
        return;
    }

    // Korean glyphs need a real font; refusing beats producing mojibake.
    let font_dir = root.join("fonts");
    if !has_font_files(&font_dir) {
        let err = QuoteError::AssetMissing {
            kind: "Korean-capable font",
            path: font_dir,
        };
        eprintln!("❌ {}", err);
        eprintln!("   Place a .ttf/.otf there (e.g. NanumGothic) and re-run. The .typ source was kept.");
        return;
    }

    println!("\n🔨 Compiling PDF...");
    match Command::new("typst")
        .arg("compile")
        .arg("--font-path")
        .arg(&font_dir)
        .arg(typ_path)
        .arg(pdf_path)
        .status()
    {
        Ok(s) if s.success() => {
            println!("✅ PDF Generated: {:?}", pdf_path);
            open_and_reveal(pdf_path);
        }
        _ => eprintln!(
            "❌ Compilation failed. The .typ source was kept at {:?}.",
            typ_path
        ),
    }
}

fn has_font_files(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries.flatten().any(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(false, |ext| {
                        ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf")
                    })
            })
        })
        .unwrap_or(false)
}

// ==========================================
// 4. Tariff Display
// ==========================================

fn show_tariff(root: &Path) {
    let tariff = load_tariff_config(root);

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("구분"),
        Cell::new("산정 단위"),
        Cell::new("단위당 용량 (kW)"),
        Cell::new("kW당 연 임대료"),
    ]);

    for entry in &tariff.categories {
        table.add_row(vec![
            Cell::new(&entry.name),
            Cell::new(&entry.config.unit_label),
            Cell::new(format!("{}", entry.config.capacity_per_unit)),
            Cell::new(format!("{} 원", format_krw(entry.config.rent_per_kw))),
        ]);
    }

    println!("--- 기준 단가표 ---");
    println!("{table}");
    println!("💡 Edit {:?} to change business terms.", root.join("tariff.toml"));
}

// ==========================================
// 5. List Logic
// ==========================================

fn list_quotations(root: &Path) {
    let output_dir = root.join("output");
    if !output_dir.exists() {
        println!("❌ No output directory found.");
        return;
    }

    println!("🔍 Scanning quotations...");
    let mut files = Vec::new();
    let mut stack = vec![output_dir.clone()];
    while let Some(dir) = stack.pop() {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().map_or(false, |e| e == "typ") {
                    files.push(path);
                }
            }
        }
    }

    if files.is_empty() {
        println!("(None found)");
        return;
    }

    files.sort_by_key(|p| fs::metadata(p).and_then(|m| m.modified()).ok());
    files.reverse();

    let stem_re = Regex::new(r"^Solar_Proposal_(.+?)(?:-(\d+))?$").unwrap();

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Recipient"),
        Cell::new("File"),
        Cell::new("PDF"),
    ]);

    for path in &files {
        let stem = path.file_stem().unwrap().to_string_lossy();
        let recipient = stem_re
            .captures(&stem)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| stem.to_string());
        let has_pdf = path.with_extension("pdf").exists();
        let relative = path.strip_prefix(&output_dir).unwrap_or(path);

        table.add_row(vec![
            Cell::new(recipient),
            Cell::new(relative.to_string_lossy()),
            Cell::new(if has_pdf { "✅" } else { "—" }),
        ]);
    }

    println!("{table}");
}

// ==========================================
// 6. Open Folder Logic
// ==========================================

fn open_folder_wizard(root: &Path) {
    let output_root = root.join("output");
    let root_opt = "📂 Open Root Output Directory".to_string();
    let mut year_opts = Vec::new();

    if output_root.exists() {
        if let Ok(years) = fs::read_dir(&output_root) {
            for entry in years.flatten() {
                if entry.path().is_dir() {
                    year_opts.push(entry.file_name().to_string_lossy().to_string());
                }
            }
        }
    }

    year_opts.sort();
    year_opts.reverse();

    let mut options = vec![root_opt.clone()];
    options.extend(year_opts);

    match Select::new("Select Folder to Open:", options).prompt() {
        Ok(choice) => {
            let target_path = if choice == root_opt {
                output_root
            } else {
                output_root.join(choice)
            };
            println!("🚀 Opening: {:?}", target_path);
            open_in_file_manager(&target_path);
        }
        Err(_) => println!("Operation cancelled."),
    }
}

// ==========================================
// 7. Config & Utilities
// ==========================================

fn get_config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "solar-quote", "app") {
        let config_dir = proj_dirs.config_dir();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).ok();
        }
        return config_dir.join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

fn load_settings() -> Option<AppSettings> {
    let path = get_config_path();
    if !path.exists() {
        return None;
    }
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

fn setup_config_wizard() -> AppSettings {
    println!("\n⚙️  --- Configuration Setup ---");
    let current = load_settings();
    let default_val = current
        .map(|s| s.data_root)
        .unwrap_or_else(|| "~/Documents/SolarQuotes".to_string());

    println!("📂 Opening folder picker...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Select Root Data Directory")
        .pick_folder();

    let new_root = if let Some(path) = picked_path {
        path.to_string_lossy().to_string()
    } else {
        println!("❌ No folder selected. Falling back to manual input.");
        Text::new("Enter Root Data Directory:")
            .with_default(&default_val)
            .prompt()
            .unwrap()
    };

    let settings = AppSettings { data_root: new_root };

    let path = get_config_path();
    let toml_str = toml::to_string_pretty(&settings).unwrap();
    fs::write(&path, toml_str).expect("Failed to save settings");
    println!("✅ Settings saved.");
    settings
}

fn expand_home_dir(path: &str) -> String {
    if path.starts_with("~") {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen("~", &home, 1);
        }
    }
    path.to_string()
}

fn load_tariff_config(root: &Path) -> TariffTable {
    let path = root.join("tariff.toml");
    if path.exists() {
        match fs::read_to_string(&path)
            .map_err(QuoteError::from)
            .and_then(|src| TariffTable::from_toml(&src))
        {
            Ok(table) => return table,
            Err(e) => {
                warn!("tariff.toml rejected: {e}");
                eprintln!("⚠️  {:?} is invalid ({}). Using built-in rates.", path, e);
            }
        }
    } else {
        println!("✨ Initializing default tariff table...");
        fs::write(&path, DEFAULT_TARIFF).expect("Failed to write tariff.toml");
    }
    TariffTable::from_toml(DEFAULT_TARIFF).expect("built-in tariff table is valid")
}

fn load_sender_config(root: &Path) -> SenderConfig {
    let path = root.join("sender.toml");
    if path.exists() {
        let content = fs::read_to_string(&path).expect("Failed to read sender.toml");
        toml::from_str(&content).expect("Failed to parse sender.toml")
    } else {
        println!("✨ Initializing default sender configuration...");
        let default_sender: SenderConfig =
            toml::from_str(DEFAULT_SENDER).expect("Failed to parse default sender.toml");
        fs::write(&path, DEFAULT_SENDER).expect("Failed to write sender.toml");
        default_sender
    }
}

// Helper: Open file and reveal in Finder/Explorer
fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg("-R").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer")
        .arg(format!("/select,{}", path.to_string_lossy()))
        .spawn()
        .ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open")
        .arg(path.parent().unwrap_or(path))
        .spawn()
        .ok();
}

fn open_in_file_manager(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(path).spawn().ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(path).spawn().ok();
}
