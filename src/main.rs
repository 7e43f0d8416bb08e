use anyhow::Result;
use clap::Parser;
use std::time::Duration;

use data_relay::cli::Cli;
use data_relay::core::{DataSource, RelayConfig, RelaySummary};
use data_relay::engine::RelayEngine;
use data_relay::services::{
    ConsoleProgressReporter, ConsoleRecordProcessor, DefaultRelayConfig, DeviceDataSource,
    JsonSummaryWriter, SimulatedDataSource,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.quiet {
        println!("🚀 データ中継ツール - 並列処理版");
        match &cli.device {
            Some(device) => println!("📂 データソース: {}", device.display()),
            None => println!("📂 データソース: シミュレーション"),
        }
    }

    // 1. ソースの選択（デバイス指定があれば実デバイス読み込み）
    let result = match &cli.device {
        Some(device) => run_with_source(DeviceDataSource::new(device), &cli).await,
        None => run_with_source(SimulatedDataSource::new(), &cli).await,
    };

    match result {
        Ok(summary) => {
            if !cli.quiet {
                println!("\n📊 処理結果:");
                println!("   - 生産レコード数: {}", summary.produced_records);
                println!("   - 処理レコード数: {}", summary.processed_records);
                println!("   - ソースエラー数: {}", summary.source_errors);
                println!("   - 処理エラー数: {}", summary.process_errors);
                println!("   - 破棄レコード数: {}", summary.discarded_records);
                println!("   - 総処理時間: {}ms", summary.total_time_ms);
                println!(
                    "   - 平均処理時間: {:.2}ms/レコード",
                    summary.average_time_per_record_ms
                );
            }

            // JSONサマリーの書き出し（指定時のみ）
            if let Some(output_path) = &cli.summary_out {
                let writer = JsonSummaryWriter::new(output_path);
                writer.write(&summary).await?;
                if !cli.quiet {
                    println!("📄 サマリーを {} に保存しました", output_path.display());
                }
            }
            Ok(())
        }
        Err(error) => {
            eprintln!("❌ エラー: {error}");
            std::process::exit(1);
        }
    }
}

/// 選択されたソースでエンジンを構築して実行する
async fn run_with_source<S>(source: S, cli: &Cli) -> Result<RelaySummary>
where
    S: DataSource + 'static,
{
    let mut config = DefaultRelayConfig::default()
        .with_producers(cli.producers)
        .with_consumers(cli.consumers)
        .with_record_max_bytes(cli.record_bytes)
        .with_drain_on_shutdown(!cli.no_drain)
        .with_progress_reporting(!cli.quiet);
    if let Some(capacity) = cli.queue_capacity {
        config = config.with_queue_capacity(capacity);
    }
    if cli.duration_ms.is_none() {
        config = config.with_records_per_producer(cli.records);
    }

    if !cli.quiet {
        println!("⚙️  設定:");
        println!("   - producer数: {}", config.producer_count());
        println!("   - consumer数: {}", config.consumer_count());
        println!("   - レコード上限: {}バイト", config.record_max_bytes());
        match config.queue_capacity() {
            Some(capacity) => println!("   - キュー容量: {capacity}"),
            None => println!("   - キュー容量: 無制限"),
        }
    }

    let processor = if cli.verbose {
        ConsoleRecordProcessor::verbose()
    } else {
        ConsoleRecordProcessor::new()
    };
    let reporter = if cli.quiet {
        ConsoleProgressReporter::quiet()
    } else {
        ConsoleProgressReporter::new()
    };

    let engine = RelayEngine::new(source, processor, config, reporter);

    let summary = match cli.duration_ms {
        Some(duration_ms) => engine.run_for(Duration::from_millis(duration_ms)).await?,
        None => engine.run().await?,
    };
    Ok(summary)
}
