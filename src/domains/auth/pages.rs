//! Static HTML served during the browser authorization step.
//!
//! The page loads MusicKit JS with the developer token, asks the user to
//! grant access, and posts the resulting Music User Token back to the
//! callback endpoint. Presentation only; all contract logic lives in
//! [`super::oauth`].

const AUTHORIZE_PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Connect Apple Music</title>
  <script src="https://js-cdn.music.apple.com/musickit/v3/musickit.js" async></script>
  <style>
    body { font-family: -apple-system, sans-serif; display: flex; flex-direction: column;
           align-items: center; margin-top: 15vh; color: #222; }
    button { font-size: 1.1rem; padding: 0.6rem 1.6rem; border-radius: 8px;
             border: none; background: #fa233b; color: #fff; cursor: pointer; }
    #status { margin-top: 1rem; color: #666; }
  </style>
</head>
<body>
  <h1>Connect Apple Music</h1>
  <p>Grant this server access to your Apple Music library.</p>
  <button id="authorize">Authorize</button>
  <p id="status"></p>
  <script>
    document.addEventListener('musickitloaded', async () => {
      await MusicKit.configure({
        developerToken: '{{DEVELOPER_TOKEN}}',
        app: { name: 'Apple Music MCP Server', build: '1.0' }
      });
    });
    document.getElementById('authorize').addEventListener('click', async () => {
      const status = document.getElementById('status');
      try {
        const musicUserToken = await MusicKit.getInstance().authorize();
        const body = new URLSearchParams({
          music_user_token: musicUserToken,
          state: '{{STATE}}',
          redirect_uri: '{{REDIRECT_URI}}'
        });
        const response = await fetch('/oauth/callback', {
          method: 'POST',
          headers: { 'Content-Type': 'application/x-www-form-urlencoded' },
          body,
          redirect: 'follow'
        });
        if (response.redirected) {
          window.location.href = response.url;
        } else {
          status.textContent = 'Authorization failed: ' + await response.text();
        }
      } catch (err) {
        status.textContent = 'Authorization failed: ' + err;
      }
    });
  </script>
</body>
</html>
"#;

/// Render the authorize page with the handshake parameters substituted in.
pub fn render_authorize_page(developer_token: &str, state: &str, redirect_uri: &str) -> String {
    AUTHORIZE_PAGE_TEMPLATE
        .replace("{{DEVELOPER_TOKEN}}", &escape_js(developer_token))
        .replace("{{STATE}}", &escape_js(state))
        .replace("{{REDIRECT_URI}}", &escape_js(redirect_uri))
}

/// Escape a value for embedding inside a single-quoted JS string.
fn escape_js(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('<', "\\u003c")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let page = render_authorize_page("dev-jwt", "S1", "http://x/cb");
        assert!(page.contains("developerToken: 'dev-jwt'"));
        assert!(page.contains("state: 'S1'"));
        assert!(page.contains("redirect_uri: 'http://x/cb'"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn test_render_escapes_quotes() {
        let page = render_authorize_page("a'b", "S", "http://x");
        assert!(page.contains("a\\'b"));
    }
}
