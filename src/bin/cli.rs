use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;

use intranet_rbac::authz::{
    default_scope_for, parse_permissions, Permission, PermissionResolver, PermissionSet, Role,
    ScopeOverrideStore,
};
use intranet_rbac::config::{init_tracing, load_env};
use intranet_rbac::db;
use intranet_rbac::events::verify_chain;
use intranet_rbac::models::user::NewUser;

#[derive(Parser, Debug)]
#[command(author, version, about = "intranet-rbac administration tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the permission catalog with labels
    Catalog,
    /// Print the built-in default scope of a role
    Scope { role: Role },
    /// Resolve a role's effective permissions against the stored overrides
    Resolve {
        role: Role,
        /// Explicit per-user permissions
        #[arg(long, num_args = 1..)]
        explicit: Vec<String>,
    },
    /// Show the stored override of a role
    OverrideShow { role: Role },
    /// Replace a role's override
    OverrideSet {
        role: Role,
        #[arg(required = true)]
        permissions: Vec<String>,
        #[arg(long)]
        acting_role: Role,
    },
    /// Reset a role's override so it falls back to its default scope
    OverrideReset {
        role: Role,
        #[arg(long)]
        acting_role: Role,
    },
    /// Register a user record for the session provider
    UserAdd {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        role: Role,
        #[arg(long)]
        department: Option<String>,
        #[arg(long, num_args = 1..)]
        explicit: Vec<String>,
    },
    /// Check the activity log hash chain
    AuditVerify,
    /// Apply pending migrations
    MigrateRun,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Catalog => {
            println!("{:<24} {:<14} {}", "Permission", "Group", "Label");
            for permission in Permission::ALL {
                println!(
                    "{:<24} {:<14} {}",
                    permission.as_str(),
                    format!("{:?}", permission.group()),
                    permission.label()
                );
            }
        }
        Commands::Scope { role } => {
            print_set(&default_scope_for(role));
        }
        Commands::Resolve { role, explicit } => {
            let explicit = parse_permissions(&explicit)?;
            let resolver = PermissionResolver::new(ScopeOverrideStore::sqlite(get_pool().await?));
            let resolution = resolver.resolve_with_source(role, &explicit).await;
            println!("source: {:?}", resolution.source);
            print_set(&resolution.permissions);
        }
        Commands::OverrideShow { role } => {
            let store = ScopeOverrideStore::sqlite(get_pool().await?);
            match store.try_read_override(role).await? {
                Some(scope) if !scope.is_empty() => print_set(&scope),
                _ => println!("no override stored for {}", role),
            }
        }
        Commands::OverrideSet { role, permissions, acting_role } => {
            let permissions = parse_permissions(&permissions)?;
            let store = ScopeOverrideStore::sqlite(get_pool().await?);
            store.write_override(role, &permissions, acting_role).await?;
            println!("override stored for {} ({} permissions)", role, permissions.len());
        }
        Commands::OverrideReset { role, acting_role } => {
            let store = ScopeOverrideStore::sqlite(get_pool().await?);
            store.reset_override(role, acting_role).await?;
            println!("override reset for {}", role);
        }
        Commands::UserAdd { name, email, role, department, explicit } => {
            let explicit_permissions = parse_permissions(&explicit)?.into_iter().collect();
            let pool = get_pool().await?;
            let user = db::users::create_user(
                &pool,
                NewUser { name, email, role, department, explicit_permissions },
            )
            .await?;
            println!("Created user {} ({})", user.id, user.role);
        }
        Commands::AuditVerify => {
            let pool = get_pool().await?;
            match verify_chain(&pool).await? {
                None => println!("activity log chain intact"),
                Some(seq) => anyhow::bail!("activity log chain broken at entry {}", seq),
            }
        }
        Commands::MigrateRun => {
            get_pool().await?;
            println!("Migrations applied");
        }
    }

    Ok(())
}

/// Connects and applies pending migrations.
async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    db::init(&database_url).await
}

fn print_set(permissions: &PermissionSet) {
    for permission in permissions {
        println!("{:<24} {}", permission.as_str(), permission.label());
    }
}
