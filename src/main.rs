use assembly_lists::config::AppConfig;
use assembly_lists::logic::{COMMITTEE_FILTER_PROPERTY, MEETING_FILTER_PROPERTY};
use assembly_lists::{
    FilterContext, JsonFileFilterStore, Member, MemberFilter, ReferenceRecord, ReferenceSnapshot,
};
use log::info;
use std::sync::Arc;

async fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = AppConfig::load()?;
    info!(
        "Configuration loaded: state_dir={} member_key={}",
        config.storage.state_dir, config.lists.member_storage_key
    );

    let store = Arc::new(JsonFileFilterStore::new(config.state_dir()));
    let context = FilterContext::new(store);
    let provider = MemberFilter::new(config.lists.member_storage_key.clone());
    let engine = context.engine::<Member>("user", &provider).await?;

    let members: Vec<Member> = match &config.input.members_path {
        Some(path) => read_json(path).await?,
        None => {
            info!("No members file configured (ASSEMBLY_INPUT__MEMBERS_PATH), listing nothing");
            Vec::new()
        }
    };

    // Reference collections are read once, so each gets a single snapshot
    let references = [
        (MEETING_FILTER_PROPERTY, &config.input.meetings_path),
        (COMMITTEE_FILTER_PROPERTY, &config.input.committees_path),
    ];
    for (property, path) in references {
        if let Some(path) = path {
            let records: Vec<ReferenceRecord> = read_json(path).await?;
            let snapshot = ReferenceSnapshot {
                revision: 1,
                records,
            };
            engine.lock().rebuild_reference(property, &snapshot);
        }
    }

    let (filtered, counts) = {
        let mut engine = engine.lock();
        engine.set_source(members);
        info!(
            "{} of {} members match {} active condition(s)",
            engine.filtered().len(),
            engine.source().len(),
            engine.active_count()
        );
        (engine.filtered().to_vec(), engine.option_counts(engine.source()))
    };

    let output = serde_json::json!({
        "members": filtered,
        "options": counts,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    context.flush().await;
    Ok(())
}
