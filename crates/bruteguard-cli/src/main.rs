mod client;
mod ranges;

use clap::Parser;

use client::AdminClient;

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().pretty().with_env_filter(filter).init();
}

#[derive(Debug, Parser)]
#[command(name = "bruteguard-cli")]
#[command(about = "Admin CLI for the bruteguard anti-bruteforce gate")]
struct Cli {
    /// Address of the bruteguard-api service.
    #[arg(long, default_value = "http://localhost:8080")]
    addr: String,

    /// Reset all rate-limit buckets.
    #[arg(long)]
    reset_all: bool,

    /// Add IP(s) or CIDR(s) to the whitelist (comma-separated, ranges allowed).
    #[arg(long, value_name = "IPS")]
    whitelist_add: Option<String>,

    /// Remove IP(s) or CIDR(s) from the whitelist.
    #[arg(long, value_name = "IPS")]
    whitelist_del: Option<String>,

    /// Add IP(s) or CIDR(s) to the blacklist.
    #[arg(long, value_name = "IPS")]
    blacklist_add: Option<String>,

    /// Remove IP(s) or CIDR(s) from the blacklist.
    #[arg(long, value_name = "IPS")]
    blacklist_del: Option<String>,

    /// Bypass the cross-list overlap check on add operations.
    #[arg(long)]
    force: bool,

    /// Print the current whitelist and blacklist.
    #[arg(long)]
    view_lists: bool,
}

async fn add_many(client: &AdminClient, ips: &str, force: bool, blacklist: bool, label: &str) {
    let entries = match ranges::expand(ips) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    for ip in entries {
        let result = if blacklist {
            client.blacklist_add(&ip, force).await
        } else {
            client.whitelist_add(&ip, force).await
        };
        report(&format!("{label} {ip}"), result);
    }
}

async fn del_many(client: &AdminClient, ips: &str, blacklist: bool, label: &str) {
    let entries = match ranges::expand(ips) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    for ip in entries {
        let result = if blacklist {
            client.blacklist_del(&ip).await
        } else {
            client.whitelist_del(&ip).await
        };
        report(&format!("{label} {ip}"), result);
    }
}

fn report(action: &str, result: Result<bruteguard_types::OkResponse, client::ApiError>) {
    match result {
        Ok(resp) if resp.ok => println!("✅ {action}"),
        Ok(resp) => {
            let reason = resp.reason.unwrap_or_else(|| "unknown error".to_string());
            println!("❌ {action}: {reason}");
        }
        Err(e) => println!("❌ {action}: {e}"),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let client = AdminClient::new(&cli.addr);

    if cli.reset_all {
        report("reset all buckets", client.reset_all().await);
        return;
    }

    if let Some(ips) = &cli.whitelist_add {
        add_many(&client, ips, cli.force, false, "whitelisted").await;
        return;
    }

    if let Some(ips) = &cli.whitelist_del {
        del_many(&client, ips, false, "removed from whitelist").await;
        return;
    }

    if let Some(ips) = &cli.blacklist_add {
        add_many(&client, ips, cli.force, true, "blacklisted").await;
        return;
    }

    if let Some(ips) = &cli.blacklist_del {
        del_many(&client, ips, true, "removed from blacklist").await;
        return;
    }

    if cli.view_lists {
        match client.view_lists().await {
            Ok(resp) => {
                if resp.whitelist.is_empty() {
                    println!("Whitelist is empty");
                } else {
                    println!("Whitelisted: {}", resp.whitelist.join(", "));
                }
                if resp.blacklist.is_empty() {
                    println!("Blacklist is empty");
                } else {
                    println!("Blacklisted: {}", resp.blacklist.join(", "));
                }
            }
            Err(e) => eprintln!("❌ failed to fetch lists: {e}"),
        }
        return;
    }

    eprintln!("no action given; run with --help for usage");
}
