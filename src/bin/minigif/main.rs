use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

mod cli;
mod util;
mod cmd_status;
mod cmd_show;
mod cmd_backup;
mod cmd_validate;
mod cmd_export;
mod cmd_import;
mod cmd_gif;
mod cmd_settings;
mod cmd_orphans;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт: info.
    // Пример: RUST_LOG=debug ./minigif status
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    let data_dir = cli.data_dir;
    match cli.cmd {
        cli::Cmd::Status { json } =>
            cmd_status::exec(data_dir, json),

        cli::Cmd::Show { json } =>
            cmd_show::exec(data_dir, json),

        cli::Cmd::Backup =>
            cmd_backup::exec_backup(data_dir),

        cli::Cmd::Backups =>
            cmd_backup::exec_list(data_dir),

        cli::Cmd::RestoreBackup =>
            cmd_backup::exec_restore(data_dir),

        cli::Cmd::Validate { file } =>
            cmd_validate::exec(file),

        cli::Cmd::Export { out, category } =>
            cmd_export::exec(data_dir, out, category),

        cli::Cmd::Import { from, strategy } =>
            cmd_import::exec(data_dir, from, strategy),

        cli::Cmd::GifSave { id, url, file } =>
            cmd_gif::exec_save(data_dir, id, url, file),

        cli::Cmd::GifDelete { id } =>
            cmd_gif::exec_delete(data_dir, id),

        cli::Cmd::GifCopy { from, to } =>
            cmd_gif::exec_copy(data_dir, from, to),

        cli::Cmd::Hotkey { set } =>
            cmd_settings::exec_hotkey(data_dir, set),

        cli::Cmd::Order { set } =>
            cmd_settings::exec_order(data_dir, set),

        cli::Cmd::Orphans { json } =>
            cmd_orphans::exec(data_dir, json),
    }
}
