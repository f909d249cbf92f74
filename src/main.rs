use clap::Parser;
use field_inventory::{cli, config, error, export, inventory, photos, storage};
use cli::{Cli, Commands};
use config::Config;
use error::{InventoryError, Result};
use export::{default_output_path, ExportOutcome, Exporter};
use field_inventory_common::{
    clamp_page, page_count, paginate, select, Error as CommonError, HistoryKind, MissingField,
    Record,
};
use inventory::Inventory;
use photos::PhotoImporter;
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "field_inventory=debug"
    } else {
        "field_inventory=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("✖ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    if let Commands::Config { show, set } = &cli.command {
        return run_config(config, *show, set.clone());
    }

    let mut inventory = open_inventory(&config, &cli.command).await?;

    match cli.command {
        Commands::Add { major, minor, specific, item, quantity, photos, gallery, scanning } => {
            println!("📝 field-inventory - 記録追加\n");

            inventory.new_draft();
            {
                let fields = &mut inventory.form_mut().fields;
                if let Some(major) = major {
                    fields.major_location = major;
                }
                fields.minor_location = minor;
                fields.specific_name = specific;
                fields.item_name = item;
                fields.quantity = quantity;
            }
            inventory.form_mut().set_scanning_methods(&scanning);
            check_text_fields(&inventory)?;

            let importer = PhotoImporter::from_config(&config)?;
            let imported = import_photos(&importer, &mut inventory, &photos, gallery.as_deref()).await;

            let id = submit_or_discard(&mut inventory, &importer, &imported).await?;
            println!("\n✔ 記録を追加しました (ID: {})", id);
        }

        Commands::Edit {
            id,
            major,
            minor,
            specific,
            item,
            quantity,
            add_photos,
            gallery,
            remove_photos,
            scanning,
            clear_scan,
        } => {
            println!("✏️ field-inventory - 記録編集\n");

            inventory.start_edit(id)?;
            {
                let fields = &mut inventory.form_mut().fields;
                if let Some(v) = major {
                    fields.major_location = v;
                }
                if let Some(v) = minor {
                    fields.minor_location = v;
                }
                if let Some(v) = specific {
                    fields.specific_name = v;
                }
                if let Some(v) = item {
                    fields.item_name = v;
                }
                if let Some(v) = quantity {
                    fields.quantity = v;
                }
            }

            // 後ろから消すと番号がずれない
            let mut indices: Vec<usize> = remove_photos.into_iter().filter(|&n| n >= 1).collect();
            indices.sort_unstable_by(|a, b| b.cmp(a));
            indices.dedup();
            for n in indices {
                match inventory.form_mut().remove_photo_at(n - 1) {
                    Some(path) => println!("- 写真を外しました: {}", path),
                    None => println!("⚠ 写真番号 {} はありません", n),
                }
            }

            if clear_scan {
                inventory.form_mut().set_scanning_methods(&[]);
            } else if !scanning.is_empty() {
                inventory.form_mut().set_scanning_methods(&scanning);
            }

            check_text_fields(&inventory)?;

            let importer = PhotoImporter::from_config(&config)?;
            let imported =
                import_photos(&importer, &mut inventory, &add_photos, gallery.as_deref()).await;

            let id = submit_or_discard(&mut inventory, &importer, &imported).await?;
            println!("\n✔ 記録を更新しました (ID: {})", id);
        }

        Commands::Delete { ids, yes } => {
            let targets: Vec<&Record> = ids.iter().filter_map(|id| inventory.get(*id)).collect();
            if targets.is_empty() {
                println!("該当する記録がありません");
                return Ok(());
            }

            println!("削除対象:");
            for record in &targets {
                println!("  {} {}", record.id, summary_line(record));
            }

            if !yes {
                let confirmed = dialoguer::Confirm::new()
                    .with_prompt(format!("{}件を削除しますか？", targets.len()))
                    .default(false)
                    .interact()
                    .map_err(|e| InventoryError::Io(std::io::Error::other(e.to_string())))?;
                if !confirmed {
                    println!("中止しました");
                    return Ok(());
                }
            }

            let removed = inventory.delete_many(&ids).await?;
            println!("✔ {}件を削除しました", removed);
        }

        Commands::List { query, page, page_size } => {
            let page_size = page_size.unwrap_or(config.page_size).max(1);
            let entries = select(inventory.records(), &query);
            let total = entries.len();
            let page = clamp_page(page, total, page_size);
            let pages = page_count(total, page_size).max(1);

            if total == 0 {
                if query.is_empty() {
                    println!("記録がありません");
                } else {
                    println!("「{}」に一致する記録がありません", query);
                }
                return Ok(());
            }

            for entry in paginate(&entries, page_size, page) {
                println!(
                    "{:>4}. [{}] {} ({}枚)",
                    entry.seq,
                    entry.record.id,
                    summary_line(entry.record),
                    entry.record.photos().len()
                );
            }
            println!("\n{} / {} ページ（全{}件）", page, pages, total);
        }

        Commands::Show { id } => {
            let record = inventory
                .get(id)
                .ok_or(field_inventory_common::Error::NotFound(id))?;
            println!("ID:       {}", record.id);
            println!("地点:     {}", record.major_location());
            println!("区域:     {}", record.minor_location());
            println!("名称:     {}", record.specific_name());
            println!("種類:     {}", record.item_name());
            println!("数量:     {}", record.quantity());
            if !record.scanning_methods().is_empty() {
                let labels: Vec<&str> = record.scanning_methods().iter().map(|m| m.label()).collect();
                println!("スキャン: {}", labels.join("、"));
            }
            println!("写真:");
            for (i, photo) in record.photos().iter().enumerate() {
                println!("  {}) {}", i + 1, photo);
            }
        }

        Commands::History { kind, remove } => {
            if let Some(value) = remove {
                if inventory.remove_from_history(kind, &value).await? {
                    println!("✔ 履歴から削除しました: {}", value);
                } else {
                    println!("履歴にありません: {}", value);
                }
            }

            let label = match kind {
                HistoryKind::Location => "区域",
                HistoryKind::ItemType => "種類",
            };
            let history = inventory.history(kind);
            if history.is_empty() {
                println!("{}の履歴はありません", label);
            } else {
                println!("{}の履歴（新しい順）:", label);
                for (i, value) in history.entries().iter().enumerate() {
                    println!("  {}) {}", i + 1, value);
                }
            }
            if let Some(major) = inventory.last_major_location() {
                println!("前回の地点: {}", major);
            }
        }

        Commands::Export { query, output, title } => {
            println!("📄 field-inventory - PDF出力\n");

            let mut exporter = Exporter::from_config(&config).with_progress(true);
            if let Some(title) = title {
                exporter = exporter.with_title(title);
            }

            let entries = select(inventory.records(), &query);
            let output = match output {
                Some(path) => path,
                None => default_output_path(
                    &config.exports_dir()?,
                    exporter.title(),
                    chrono::Utc::now().timestamp_millis(),
                ),
            };

            println!("- {}件の記録を出力中...", entries.len());
            match exporter.export(&entries, &output).await {
                Ok(outcome) => {
                    println!("✔ PDF出力: {}", outcome.path().display());
                    if matches!(outcome, ExportOutcome::Saved(_)) {
                        println!("  共有機能が無効のため、上記の場所から開いてください");
                    }
                }
                Err(InventoryError::NothingToExport) => {
                    println!("⚠ 出力する記録がありません");
                }
                Err(e) => return Err(e),
            }
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

/// 保存データを読み込む。失敗時は書き換えを伴うコマンドのみ中止する
async fn open_inventory(config: &Config, command: &Commands) -> Result<Inventory> {
    match Inventory::load(storage::open_store(config)?).await {
        Ok(inventory) => Ok(inventory),
        Err(e) if !command.mutates() => {
            eprintln!("⚠ 保存データを読み込めませんでした: {}", e);
            Ok(Inventory::empty(storage::open_store(config)?))
        }
        Err(e) => Err(e),
    }
}

/// 写真以外の必須項目を取り込み前に確認する
fn check_text_fields(inventory: &Inventory) -> Result<()> {
    let missing: Vec<MissingField> = inventory
        .form()
        .fields
        .missing_fields()
        .into_iter()
        .filter(|field| *field != MissingField::Photos)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CommonError::Validation(missing).into())
    }
}

/// 登録に失敗したら今回取り込んだコピーを削除する
async fn submit_or_discard(
    inventory: &mut Inventory,
    importer: &PhotoImporter,
    imported: &[String],
) -> Result<i64> {
    match inventory.submit_form().await {
        Err(e) if !matches!(e, InventoryError::Persistence(_)) => {
            importer.discard(imported).await;
            Err(e)
        }
        result => result,
    }
}

/// 写真を取り込んでフォームに追加。失敗した分は通知してスキップ
async fn import_photos(
    importer: &PhotoImporter,
    inventory: &mut Inventory,
    files: &[PathBuf],
    gallery: Option<&std::path::Path>,
) -> Vec<String> {
    let mut imported = Vec::new();
    for file in files {
        match importer.capture(file).await {
            Ok(reference) => {
                println!("✔ 写真: {}", reference);
                imported.push(reference.clone());
                inventory.form_mut().add_photos([reference]);
            }
            Err(e) => println!("⚠ {}", e),
        }
    }

    if let Some(folder) = gallery {
        match importer.pick(folder).await {
            Ok(references) => {
                println!("✔ {}枚の写真を取り込みました", references.len());
                imported.extend(references.iter().cloned());
                inventory.form_mut().add_photos(references);
            }
            Err(e) => println!("⚠ {}", e),
        }
    }
    imported
}

fn summary_line(record: &Record) -> String {
    format!(
        "{} / {} / {} / {} ×{}",
        record.major_location(),
        record.minor_location(),
        record.specific_name(),
        record.item_name(),
        record.quantity()
    )
}

fn run_config(mut config: Config, show: bool, set: Option<Vec<String>>) -> Result<()> {
    if let Some(pair) = set {
        if let [key, value] = pair.as_slice() {
            config.set_value(key, value)?;
            config.save()?;
            println!("✔ {} を設定しました", key);
        }
    }

    if show {
        println!("設定:");
        println!("  データ: {}", config.data_dir()?.display());
        println!("  保存先: {}", config.storage);
        println!("  PDF変換: {}", config.rasterizer);
        println!("  変換コマンド: {}", config.rasterizer_command);
        match &config.pdf_font {
            Some(font) => println!("  PDFフォント: {}", font.display()),
            None => println!("  PDFフォント: 自動検出"),
        }
        println!("  共有: {}", config.share);
        println!("  写真エンコード: {}", config.image_encoder);
        println!("  写真アクセス: {}", if config.photo_access { "許可" } else { "拒否" });
        println!("  1ページの件数: {}", config.page_size);
        println!("  サムネイル幅: {}px (JPEG {}%)", config.thumbnail_width, config.jpeg_quality);
        println!("  報告書タイトル: {}", config.report_title);
    }

    Ok(())
}
