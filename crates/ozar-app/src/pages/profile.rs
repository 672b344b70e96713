use crate::error::AppError;
use crate::forms::ProfileForm;
use crate::session::SessionContext;

/// Save the profile form: the profile row first, then the auth identity's
/// name metadata.
pub async fn save_profile(ctx: &SessionContext, form: &ProfileForm) -> Result<(), AppError> {
    let update = form.validate()?;
    ctx.update_profile(update).await?;
    ctx.update_account_name(form.first_name.trim(), form.last_name.trim()).await?;
    Ok(())
}
