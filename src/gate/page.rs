//! Static markup for the sign-up page.

/// Two-pane layout: the wizard on the left, the product pitch on the right.
#[must_use]
pub fn layout(children: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Sign up | Corinna</title>
</head>
<body>
  <div class="h-screen flex w-full justify-center">
    <div class="w-[600px] lg:w-full flex flex-col items-start p-6">
      <img src="/images/logo.png" alt="LOGO" style="width: 20%; height: auto">
      {children}
    </div>
    <div class="hidden lg:flex flex-1 w-full max-h-full overflow-hidden relative bg-cream flex-col pt-10 pl-24 gap-3">
      <h2 class="text-gravel md:text-4xl font-bold">Hi, I am AI powered sales assistant, Corinna!</h2>
      <p class="text-iridium md:text-sm mb-10">
        Corinna is capable of capturing lead information without a form...<br>
        something never done before
      </p>
      <img src="/images/app-ui.png" alt="app image" loading="lazy" class="absolute shrink-0 top-32">
    </div>
  </div>
</body>
</html>
"#
    )
}

/// `data-step-index` of each wizard screen. Account type is picked in the
/// browser, so a stored wizard starts on [`CREDENTIALS_STEP`].
pub const ACCOUNT_TYPE_STEP: u8 = 0;
pub const CREDENTIALS_STEP: u8 = 1;
pub const OTP_STEP: u8 = 2;

/// The three wizard screens plus the inline script that switches between
/// them, posts to the JSON endpoints and follows the returned `step` and
/// `redirect`.
#[must_use]
pub fn wizard() -> &'static str {
    r#"<div id="sign-up-wizard" data-step="0" data-otp-endpoint="/auth/sign-up/otp" data-complete-endpoint="/auth/sign-up/complete">
  <div data-toasts role="status"></div>
  <section data-step-index="0">
    <h2>Create an account</h2>
    <p>Tell us about yourself! What do you do? Let's tailor your experience so it best suits you.</p>
    <label><input type="radio" name="account_type" value="owner" checked> I own a business</label>
    <label><input type="radio" name="account_type" value="student"> I am a student</label>
    <button type="button" data-action="next">Continue</button>
  </section>
  <section data-step-index="1" hidden>
    <h2>Account details</h2>
    <input name="email" type="email" autocomplete="email" placeholder="Email" required>
    <input name="confirm_email" type="email" autocomplete="email" placeholder="Confirm email" required>
    <input name="password" type="password" autocomplete="new-password" placeholder="Password" required>
    <input name="confirm_password" type="password" autocomplete="new-password" placeholder="Confirm password" required>
    <button type="button" data-action="generate-otp">Continue</button>
  </section>
  <section data-step-index="2" hidden>
    <h2>Enter OTP</h2>
    <p>Enter the one time password that was sent to your email.</p>
    <input name="full_name" autocomplete="name" placeholder="Full name" required>
    <input name="otp" inputmode="numeric" maxlength="6" placeholder="000000" required>
    <button type="button" data-action="complete">Create an account</button>
  </section>
  <p>Already have an account? <a href="/auth/sign-in">Sign In</a></p>
</div>
<script>
(() => {
  const root = document.getElementById("sign-up-wizard");
  const value = (name) => root.querySelector(`[name='${name}']`).value;
  const accountType = () => root.querySelector("[name='account_type']:checked").value;
  const show = (step) => {
    root.dataset.step = String(step);
    for (const section of root.querySelectorAll("section[data-step-index]")) {
      section.hidden = section.dataset.stepIndex !== String(step);
    }
  };
  const notify = (toasts) => {
    const box = root.querySelector("[data-toasts]");
    box.replaceChildren(...toasts.map((t) => {
      const p = document.createElement("p");
      p.textContent = `${t.title}: ${t.description}`;
      return p;
    }));
  };
  const post = async (button, url, body) => {
    button.disabled = true;
    try {
      const res = await fetch(url, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body),
      });
      const text = await res.text();
      let data;
      try { data = JSON.parse(text); } catch { data = { toasts: [{ title: "Error", description: text }] }; }
      if (data.errors) {
        notify(Object.values(data.errors).map((d) => ({ title: "Error", description: d })));
        return;
      }
      if (data.wizard_id) root.dataset.wizardId = data.wizard_id;
      notify(data.toasts || []);
      if (typeof data.step === "number") show(data.step);
      if (data.redirect) window.location.assign(data.redirect);
    } finally {
      button.disabled = false;
    }
  };
  root.querySelector("[data-action='next']").addEventListener("click", () => show(1));
  root.querySelector("[data-action='generate-otp']").addEventListener("click", (e) =>
    post(e.currentTarget, root.dataset.otpEndpoint, {
      wizard_id: root.dataset.wizardId,
      account_type: accountType(),
      email: value("email"),
      confirm_email: value("confirm_email"),
      password: value("password"),
      confirm_password: value("confirm_password"),
    }));
  root.querySelector("[data-action='complete']").addEventListener("click", (e) =>
    post(e.currentTarget, root.dataset.completeEndpoint, {
      wizard_id: root.dataset.wizardId,
      account_type: accountType(),
      full_name: value("full_name"),
      otp: value("otp"),
    }));
})();
</script>"#
}
