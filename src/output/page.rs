use crate::directory::Category;

use super::escape_html;

/// Inner HTML of the `results` element.
pub fn render_results_fragment(sections: &[Category]) -> String {
    let mut out = String::new();
    for cat in sections {
        out.push_str("<section class=\"category-section\">\n");
        out.push_str(&format!("  <h2>{}</h2>\n", escape_html(&cat.name)));
        out.push_str(&format!(
            "  <p class=\"category-desc\">{}</p>\n",
            escape_html(&cat.description)
        ));
        out.push_str("  <ul class=\"company-list\">\n");
        for name in &cat.companies {
            out.push_str(&format!("    <li>{}</li>\n", escape_html(name)));
        }
        out.push_str("  </ul>\n");
        out.push_str("</section>\n");
    }
    out
}

pub fn render_page(sections: &[Category], term: &str) -> String {
    let results = render_results_fragment(sections);
    let term = escape_html(term);

    format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Company Directory</title>
  <style>
    body {{
      font-family: 'Inter', sans-serif;
      margin: 0;
      background: #f8fafc;
      color: #0f172a;
    }}
    main {{
      max-width: 960px;
      margin: 0 auto;
      padding: 2.5rem 2rem;
    }}
    #searchInput {{
      width: 100%;
      padding: 0.75rem 1rem;
      border: 1px solid #cbd5e1;
      border-radius: 0.75rem;
      font-size: 1rem;
    }}
    .category-section {{
      margin-top: 2rem;
    }}
    .category-section h2 {{
      font-family: 'Montserrat', sans-serif;
      font-weight: 800;
      letter-spacing: -0.025em;
      margin-bottom: 0.25rem;
    }}
    .category-desc {{
      color: #64748b;
      margin-top: 0;
    }}
    .company-list li {{
      padding: 0.25rem 0;
    }}
  </style>
</head>
<body>
  <main>
    <h1>Company Directory</h1>
    <form method="get" action="/">
      <input id="searchInput" name="q" type="search" value="{term}" placeholder="Search companies..." autocomplete="off"/>
    </form>
    <div id="results">
{results}    </div>
  </main>

  <script>
    (function() {{
      var input = document.getElementById('searchInput');
      var results = document.getElementById('results');
      var latest = 0;
      var pending = null;
      input.addEventListener('input', function() {{
        var seq = ++latest;
        if (pending) pending.abort();
        pending = new AbortController();
        fetch('/results?q=' + encodeURIComponent(input.value), {{ signal: pending.signal }})
          .then(function(resp) {{ return resp.ok ? resp.text() : null; }})
          .then(function(html) {{
            // Only the response for the newest input may touch the results.
            if (html !== null && seq === latest) results.innerHTML = html;
          }})
          .catch(function(err) {{
            if (err.name !== 'AbortError') console.error('filter request failed', err);
          }});
      }});
    }})();
  </script>
</body>
</html>
"####
    )
}
