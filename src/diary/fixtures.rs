//! Synthetic diary pages shaped like the real monthly tables.

pub const EMPTY_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <div class="content">
      <p class="empty_phrase">Нет данных за выбранный период</p>
    </div>
  </body>
</html>"#;

/// Colour and monochrome variants of a phenomenon icon, as the diary renders them.
pub fn icon(token: &str) -> String {
    format!(
        r#"<img src="//st6.gismeteo.ru/static/diary/img/{token}.png" class="screen_icon"><img src="//st6.gismeteo.ru/static/diary/img/bw/{token}.png" class="print_icon">"#
    )
}

pub fn still() -> String {
    r#"<img src="//st6.gismeteo.ru/static/diary/img/still.gif">"#.to_string()
}

/// One table row: day, then day-time and evening blocks of five cells each.
pub fn row(day: &str, temp: &str, weather: &str, evening_temp: &str, evening_weather: &str) -> String {
    let cloud = r#"<img src="//st6.gismeteo.ru/static/diary/img/dull.png">"#;
    format!(
        "<tr>\n  <td>{day}</td>\n  <td>{temp}</td><td>747</td><td>{cloud}</td><td>{weather}</td><td>С 3м/с</td>\n  <td>{evening_temp}</td><td>749</td><td>{cloud}</td><td>{evening_weather}</td><td>З 2м/с</td>\n</tr>"
    )
}

pub fn diary_page(rows: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body>
    <table>
      <tr><th rowspan="2">Число</th><th colspan="5">День</th><th colspan="5">Вечер</th></tr>
      <tr><th>Темп.</th><th>Давл.</th><th>Обл.</th><th>Явл.</th><th>Ветер</th><th>Темп.</th><th>Давл.</th><th>Обл.</th><th>Явл.</th><th>Ветер</th></tr>
      {}
    </table>
  </body>
</html>"#,
        rows.join("\n")
    )
}

/// A page with a plain row for each day, all at `temperature` and clear weather.
pub fn month_page(days: impl IntoIterator<Item = u32>, temperature: i32) -> String {
    let rows: Vec<String> = days
        .into_iter()
        .map(|day| row(&day.to_string(), &temperature.to_string(), "", "", ""))
        .collect();
    diary_page(&rows)
}
