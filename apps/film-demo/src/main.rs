mod components;
mod films;

use just_core::{BindingError, ConfigError, Runtime, Value};
use just_dom::{Document, DomError, Event, EventInit};
use thiserror::Error;

use components::{find_customized, FILM_DETAILS, PAGE_NAV};
use films::FilmTransform;

const APP_MARKUP: &str = r#"
<ghibli-app>
  <nav is="page-nav"><template><button data-strategy="page"></button></template></nav>
  <section is="film-details">
    <template>
      <h2 data-strategy text="title"></h2>
      <p data-strategy text="description"></p>
      <dl>
        <dt>Director</dt><dd data-strategy text="director"></dd>
        <dt>Released</dt><dd data-strategy text="release_date"></dd>
        <dt>Score</dt><dd data-strategy text="rt_score"></dd>
      </dl>
    </template>
  </section>
</ghibli-app>
"#;

#[derive(Debug, Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error("film data: {0}")]
    Data(#[from] serde_json::Error),
    #[error("<{0}> was not upgraded")]
    NotUpgraded(&'static str),
}

fn main() -> Result<(), DemoError> {
    env_logger::init();

    println!("=== Just-RS Film Demo ===");
    let films = films::load()?;
    let runtime = Runtime::new();
    runtime.register_transform(FilmTransform);

    let document = Document::new();
    components::define_all(&runtime, &document)?;
    document.body().append_child(&document.parse_fragment(APP_MARKUP)?)?;

    let body = document.body();
    let nav = find_customized(&body, PAGE_NAV).ok_or(DemoError::NotUpgraded(PAGE_NAV))?;
    let details =
        find_customized(&body, FILM_DETAILS).ok_or(DemoError::NotUpgraded(FILM_DETAILS))?;
    nav.set("items", Value::from_serialize(&films)?)?;
    log::info!("loaded {} films", films.len());

    let buttons = nav.element().elements_by_tag("button");
    for index in [1, 3] {
        let Some(button) = buttons.get(index) else {
            continue;
        };
        println!("\n-- click '{}'", button.text_content());
        button.dispatch_event(&Event::new("click", EventInit::default()));
        let batches = document.flush_mutations();
        log::debug!("delivered {batches} mutation batch(es)");

        println!("current page: {}", nav.get("currentPage"));
        println!("details: {}", details.get("film").get("title").cloned().unwrap_or_default());
        println!("{}", details.element().outer_html());
    }

    Ok(())
}
