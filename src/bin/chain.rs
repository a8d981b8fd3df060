use settle::combinator::{every, some};
use settle::future::Future;
use settle::settling::Settling;

fn main() {
    let (config, config_resolver) = Future::<String, String>::pair();
    let (cache, cache_resolver) = Future::<String, String>::pair();
    let (origin, origin_resolver) = Future::<String, String>::pair();

    let loaded = every::<String, String>(vec![config.into(), origin.clone().into()])
        .then(|parts| Ok(Settling::Value(parts.join(" + "))));

    loaded.done(
        |summary| println!("loaded: {summary}"),
        |err| eprintln!("load failed: {err}"),
    );

    some::<String, String>(vec![cache.into(), origin.into()]).done(
        |hit| println!("serving from: {hit}"),
        |misses| eprintln!("every source missed: {misses:?}"),
    );

    cache_resolver.reject("cache miss".into());
    config_resolver.accept("defaults".into());
    origin_resolver.accept("origin payload".into());

    settle::schedule::run();
}
