use clap::Parser;

/// 貸出管理サービスの設定
///
/// コマンドライン引数、未指定時は環境変数から読み込む。
#[derive(Debug, Clone, Parser)]
#[command(name = "library-loans")]
#[command(about = "Library loan tracking service")]
pub struct Config {
    /// HTTPサーバーの待ち受けアドレス
    #[arg(long, default_value = "0.0.0.0:3000", env = "LISTEN_ADDR")]
    pub listen_addr: String,

    /// PostgreSQLの接続URL（未指定の場合はインメモリストアで起動）
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// コネクションプールの最大接続数
    #[arg(long, default_value = "5", env = "DATABASE_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// ログフィルタ（tracing-subscriberのEnvFilter書式）
    #[arg(
        long,
        default_value = "library_loans=debug,tower_http=debug",
        env = "RUST_LOG"
    )]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:3000".to_string(),
            database_url: None,
            max_connections: 5,
            log_filter: "library_loans=debug,tower_http=debug".to_string(),
        }
    }
}
